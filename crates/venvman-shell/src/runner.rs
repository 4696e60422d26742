use log::{debug, trace};
use std::collections::BTreeSet;
use std::process::ExitStatus;
use std::time::Duration;

use venvman_platform::{ShellSettings, background_command};

use crate::command::{ResolvedShell, ToolCommand, sub_shell_command};
use crate::error::ShellError;

/// Exit status a POSIX shell reports when it cannot find a command.
pub const COMMAND_NOT_FOUND_STATUS: i32 = 127;

/// Fragments of warnings an interactive shell prints when it has no
/// controlling terminal.
const INTERACTIVE_WARNINGS: &[&str] = &[
    "cannot set terminal process group",
    "Inappropriate ioctl for device",
    "no job control in this shell",
];

/// Exit statuses a tool uses to signal success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessStatuses(BTreeSet<i32>);

impl SuccessStatuses {
    #[must_use]
    pub fn new(statuses: &[i32]) -> Self {
        Self(statuses.iter().copied().collect())
    }

    #[must_use]
    pub fn contains(&self, status: i32) -> bool {
        self.0.contains(&status)
    }
}

impl Default for SuccessStatuses {
    fn default() -> Self {
        Self::new(&[0])
    }
}

/// Everything a finished process produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// A status paired with the text callers should look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: i32,
    pub success: bool,
    /// Stdout on success, a diagnostic on failure.
    pub text: String,
}

impl CapturedOutput {
    /// Status, stdout and stderr in one message, for error reports.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        format!(
            "STATUS: {} ; \nSTDOUT: {} ; \nSTDERR: {}",
            self.status, self.stdout, self.stderr
        )
    }

    #[must_use]
    pub fn into_result(self, success_statuses: &SuccessStatuses) -> CommandResult {
        let success = success_statuses.contains(self.status);
        let text = if success {
            let mut stdout = self.stdout;
            if stdout.ends_with('\n') {
                stdout.pop();
            }
            stdout
        } else {
            self.diagnostic()
        };
        CommandResult {
            status: self.status,
            success,
            text,
        }
    }
}

fn status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

/// Run `argv` to completion and capture its output.
///
/// A non-zero exit status is not an error; only failing to launch the
/// program or exceeding `timeout` is.
///
/// # Errors
/// Returns [`ShellError::Spawn`] or [`ShellError::Timeout`].
pub async fn run_captured(
    argv: &[String],
    timeout: Option<Duration>,
) -> Result<CapturedOutput, ShellError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(ShellError::InvalidArgument(String::new()));
    };
    debug!("command = {argv:?}");

    let mut cmd = background_command(program, args);

    let spawn_error = |error: std::io::Error| ShellError::Spawn {
        program: program.clone(),
        kind: error.kind(),
        message: error.to_string(),
    };

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, cmd.output())
            .await
            .map_err(|_| ShellError::Timeout {
                command: argv.join(" "),
                seconds: limit.as_secs(),
            })?
            .map_err(spawn_error)?,
        None => cmd.output().await.map_err(spawn_error)?,
    };

    let captured = CapturedOutput {
        status: status_code(output.status),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!("status = {}", captured.status);
    trace!("stdout = {}", captured.stdout);
    if !captured.stderr.is_empty() {
        trace!("stderr = {}", captured.stderr);
    }
    Ok(captured)
}

/// Run `argv` and normalise its outcome against `success_statuses`.
///
/// # Errors
/// See [`run_captured`].
pub async fn status_output(
    argv: &[String],
    success_statuses: &SuccessStatuses,
    timeout: Option<Duration>,
) -> Result<CommandResult, ShellError> {
    let result = run_captured(argv, timeout)
        .await?
        .into_result(success_statuses);
    debug!("data = {}", result.text);
    Ok(result)
}

#[must_use]
pub fn has_interactive_warning(line: &str) -> bool {
    INTERACTIVE_WARNINGS
        .iter()
        .any(|warning| line.contains(warning))
}

/// Drop the lines of `text` that are interactive-shell warnings, keeping
/// the line endings of everything else.
#[must_use]
pub fn remove_interactive_shell_warnings(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !has_interactive_warning(line))
        .collect()
}

/// Runs tool commands through the user's shell with a fixed configuration.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    settings: ShellSettings,
}

impl ShellRunner {
    #[must_use]
    pub fn new(settings: ShellSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    /// Run `command` after sourcing the setup file quietly and classify
    /// its exit status.
    ///
    /// # Errors
    /// Fails when the shell cannot be resolved or launched, or on timeout.
    pub async fn run(
        &self,
        command: &ToolCommand,
        success_statuses: &SuccessStatuses,
    ) -> Result<CommandResult, ShellError> {
        let argv = sub_shell_command(command, true, &self.settings)?;
        status_output(&argv, success_statuses, self.settings.command_timeout()).await
    }

    /// Run `command` and hand back the raw output for tools whose stderr
    /// carries meaning.
    ///
    /// # Errors
    /// See [`ShellRunner::run`].
    pub async fn run_captured(&self, command: &ToolCommand) -> Result<CapturedOutput, ShellError> {
        let argv = sub_shell_command(command, true, &self.settings)?;
        run_captured(&argv, self.settings.command_timeout()).await
    }

    /// Source the setup file alone, keeping its output visible.
    ///
    /// # Errors
    /// See [`ShellRunner::run`].
    pub async fn check_setup(&self) -> Result<CommandResult, ShellError> {
        let argv = ResolvedShell::resolve(&self.settings)?.command_line("", false)?;
        status_output(
            &argv,
            &SuccessStatuses::default(),
            self.settings.command_timeout(),
        )
        .await
    }
}
