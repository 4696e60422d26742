use log::debug;
use std::path::{Path, PathBuf};

use venvman_platform::{ShellSettings, default_setup_file};

use crate::error::ShellError;

/// Shells whose syntax cannot run the POSIX script we generate.
const UNSUPPORTED_SHELLS: &[&str] = &[
    "fish",
    "nu",
    "pwsh",
    "powershell",
    "elvish",
    "xonsh",
    "csh",
    "tcsh",
];

const SETUP_OUTPUT_REDIRECTION: &str = " 1>/dev/null 2>&1";

/// A tool invocation rendered into a single, safely quoted shell word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    words: Vec<String>,
}

impl ToolCommand {
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            words: vec![program.to_string()],
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.words.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn arg_if(self, condition: bool, arg: impl Into<String>) -> Self {
        if condition { self.arg(arg) } else { self }
    }

    #[must_use]
    pub fn opt_arg(self, arg: Option<String>) -> Self {
        match arg {
            Some(arg) => self.arg(arg),
            None => self,
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        self.words.first().map_or("", String::as_str)
    }

    /// Render the words as one POSIX shell command line.
    ///
    /// # Errors
    /// Returns [`ShellError::InvalidArgument`] if a word contains a NUL byte.
    pub fn render(&self) -> Result<String, ShellError> {
        self.words
            .iter()
            .map(|word| quote(word))
            .collect::<Result<Vec<_>, _>>()
            .map(|words| words.join(" "))
    }
}

fn quote(word: &str) -> Result<String, ShellError> {
    shlex::try_quote(word)
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| ShellError::InvalidArgument(word.to_string()))
}

/// The user's shell, resolved to an executable on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShell {
    pub path: PathBuf,
    pub interactive: bool,
    /// File sourced before every command, if setup is enabled.
    pub setup_file: Option<PathBuf>,
}

impl ResolvedShell {
    /// Resolve the configured shell and its setup file.
    ///
    /// # Errors
    /// Returns [`ShellError::Unsupported`] for non-POSIX shells and
    /// [`ShellError::NotFound`] when the shell is not on `PATH`.
    pub fn resolve(settings: &ShellSettings) -> Result<Self, ShellError> {
        let requested = settings.shell.trim();
        debug!("requested shell = {requested:?}");
        reject_unsupported(requested)?;

        let path = which::which(requested).map_err(|_| ShellError::NotFound {
            shell: requested.to_string(),
        })?;
        let path = std::path::absolute(&path).unwrap_or(path);
        debug!("shell path = {}", path.display());

        let file_name = shell_file_name(&path);
        reject_unsupported(&file_name)?;

        let setup_file = if settings.use_setup {
            match &settings.setup_file {
                Some(file) => Some(file.clone()),
                None => Some(default_setup_file(&file_name).map_err(|error| {
                    ShellError::SetupFile {
                        shell: file_name.clone(),
                        reason: error.to_string(),
                    }
                })?),
            }
        } else {
            None
        };
        debug!("setup file = {setup_file:?}, interactive = {}", settings.interactive);

        Ok(Self {
            path,
            interactive: settings.interactive,
            setup_file,
        })
    }

    /// Build the argument vector running `script` in this shell, after the
    /// setup file has been sourced successfully.
    ///
    /// # Errors
    /// Returns an error if the setup file path cannot be quoted.
    pub fn command_line(
        &self,
        script: &str,
        suppress_setup_output: bool,
    ) -> Result<Vec<String>, ShellError> {
        let mut steps = Vec::with_capacity(2);
        if let Some(setup_file) = &self.setup_file {
            let redirection = if suppress_setup_output {
                SETUP_OUTPUT_REDIRECTION
            } else {
                ""
            };
            let setup_file = quote(&setup_file.to_string_lossy())?;
            steps.push(format!(". {setup_file}{redirection}"));
        }
        if !script.is_empty() {
            steps.push(script.to_string());
        }

        let mut argv = vec![self.path.to_string_lossy().into_owned(), "-c".to_string()];
        if self.interactive {
            argv.push("-i".to_string());
        }
        argv.push(steps.join(" && "));
        Ok(argv)
    }
}

fn shell_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn reject_unsupported(shell: &str) -> Result<(), ShellError> {
    let name = Path::new(shell)
        .file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let name = name.strip_suffix(".exe").unwrap_or(&name);
    if UNSUPPORTED_SHELLS.contains(&name) {
        log::error!("Support for {name} not yet added");
        return Err(ShellError::Unsupported {
            shell: name.to_string(),
        });
    }
    Ok(())
}

/// Build an argument vector that runs `command` in the user's shell.
///
/// # Errors
/// See [`ResolvedShell::resolve`] and [`ToolCommand::render`].
pub fn sub_shell_command(
    command: &ToolCommand,
    suppress_setup_output: bool,
    settings: &ShellSettings,
) -> Result<Vec<String>, ShellError> {
    let script = command.render()?;
    ResolvedShell::resolve(settings)?.command_line(&script, suppress_setup_output)
}
