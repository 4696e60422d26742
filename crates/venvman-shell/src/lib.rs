mod command;
mod error;
mod runner;

pub use command::{ResolvedShell, ToolCommand, sub_shell_command};
pub use error::ShellError;
pub use runner::{
    COMMAND_NOT_FOUND_STATUS, CapturedOutput, CommandResult, ShellRunner, SuccessStatuses,
    has_interactive_warning, remove_interactive_shell_warnings, run_captured, status_output,
};
