use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_WORKON_DIR_NAME: &str = ".virtualenvs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
}

/// The directory `virtualenvwrapper` and the `venv` driver keep environments
/// in when `WORKON_HOME` is unset.
///
/// # Errors
/// Returns an error when the home directory cannot be determined.
pub fn default_workon_home() -> Result<PathBuf, PathsError> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_WORKON_DIR_NAME))
        .ok_or(PathsError::HomeDirUnavailable)
}

/// The startup file an interactive `shell_file_name` would read, for example
/// `~/.bashrc` for `bash`.
///
/// # Errors
/// Returns an error when the home directory cannot be determined.
pub fn default_setup_file(shell_file_name: &str) -> Result<PathBuf, PathsError> {
    dirs::home_dir()
        .map(|home| home.join(format!(".{shell_file_name}rc")))
        .ok_or(PathsError::HomeDirUnavailable)
}

/// Expand `~` and `$VAR` references using the real process environment.
#[must_use]
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(expand_with(raw, |name| std::env::var(name).ok()))
}

pub(crate) fn expand_with<F>(raw: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    shellexpand::full_with_context_no_errors(
        raw,
        || dirs::home_dir().map(|home| home.to_string_lossy().into_owned()),
        |name| lookup(name),
    )
    .into_owned()
}
