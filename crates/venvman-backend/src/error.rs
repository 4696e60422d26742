use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Implementation not found: {details}")]
    ImplementationNotFound { details: String },

    #[error("Command not found: {command}. {details}")]
    CommandNotFound { command: String, details: String },

    #[error("Could not locate Python {interpreter} ; {details}")]
    InterpreterNotFound {
        interpreter: String,
        details: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No virtual environment called {name:?} is found. Found {}", quoted_list(.available))]
    NotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Could not {operation}: {details}")]
    OperationFailed {
        operation: &'static str,
        details: String,
    },

    #[error("Operation not supported by {subject}: {operation}")]
    Unsupported {
        subject: String,
        operation: &'static str,
    },

    #[error("No {kind} matching {name:?}. Available {kind}s: {}", .available.join(", "))]
    NoSuchDriver {
        kind: &'static str,
        name: String,
        available: Vec<String>,
    },

    #[error("IO error ({kind}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Timeout after {seconds}s waiting for {command}")]
    Timeout { command: String, seconds: u64 },
}

fn quoted_list(names: &[String]) -> String {
    if names.is_empty() {
        return "none".to_string();
    }
    names
        .iter()
        .map(|name| format!("{name:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl DriverError {
    pub fn implementation_not_found(details: impl Into<String>) -> Self {
        Self::ImplementationNotFound {
            details: details.into(),
        }
    }

    pub fn command_not_found(command: impl Into<String>, details: impl Into<String>) -> Self {
        Self::CommandNotFound {
            command: command.into(),
            details: details.into(),
        }
    }

    pub fn interpreter_not_found(
        interpreter: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::InterpreterNotFound {
            interpreter: interpreter.into(),
            details: details.into(),
        }
    }

    pub fn invalid_argument(details: impl Into<String>) -> Self {
        Self::InvalidArgument(details.into())
    }

    pub fn not_found(name: impl Into<String>, available: &[String]) -> Self {
        Self::NotFound {
            name: name.into(),
            available: available.to_vec(),
        }
    }

    pub fn operation_failed(operation: &'static str, details: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation,
            details: details.into(),
        }
    }

    pub fn unsupported(subject: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            subject: subject.into(),
            operation,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_implementation_not_found(&self) -> bool {
        matches!(self, Self::ImplementationNotFound { .. })
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
