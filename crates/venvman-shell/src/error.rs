use thiserror::Error;
use venvman_backend::DriverError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error("Could not determine the path to {shell}")]
    NotFound { shell: String },

    #[error("Support for {shell} not yet added")]
    Unsupported { shell: String },

    #[error("Could not resolve a setup file for {shell}: {reason}")]
    SetupFile { shell: String, reason: String },

    #[error("Argument cannot be passed through a POSIX shell: {0:?}")]
    InvalidArgument(String),

    #[error("Failed to launch {program}: {message}")]
    Spawn {
        program: String,
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Timeout after {seconds}s waiting for {command}")]
    Timeout { command: String, seconds: u64 },
}

impl From<ShellError> for DriverError {
    fn from(err: ShellError) -> Self {
        match err {
            ShellError::NotFound { ref shell } => {
                DriverError::command_not_found(shell.clone(), err.to_string())
            }
            ShellError::Unsupported { shell } => {
                DriverError::unsupported(format!("the {shell} shell"), "running tool commands")
            }
            ShellError::SetupFile { .. } => {
                DriverError::operation_failed("build shell command", err.to_string())
            }
            ShellError::InvalidArgument(argument) => DriverError::invalid_argument(format!(
                "{argument:?} cannot be passed through a POSIX shell"
            )),
            ShellError::Spawn {
                program,
                kind: std::io::ErrorKind::NotFound,
                message,
            } => DriverError::command_not_found(program, message),
            ShellError::Spawn { kind, message, .. } => DriverError::Io { kind, message },
            ShellError::Timeout { command, seconds } => DriverError::Timeout { command, seconds },
        }
    }
}
