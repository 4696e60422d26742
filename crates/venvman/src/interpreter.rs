use log::{debug, trace};
use std::path::{Path, PathBuf};
use std::time::Duration;

use venvman_backend::{DriverError, read_pyvenv_config, venv_python_path};
use venvman_shell::run_captured;

const VERSION_TIMEOUT: Duration = Duration::from_secs(30);

/// The interpreter of the environment rooted at `env_dir`.
///
/// # Errors
/// Returns [`DriverError::InvalidArgument`] when `env_dir` has no interpreter
/// where a virtual environment keeps one.
pub fn python_executable_path(env_dir: &Path) -> Result<PathBuf, DriverError> {
    let executable = venv_python_path(env_dir);
    if !executable.exists() {
        return Err(DriverError::invalid_argument(format!(
            "Could not locate Python executable for supposed virtual environment {}",
            env_dir.display()
        )));
    }
    Ok(executable)
}

/// First line of `python --version` inside the environment, such as
/// `Python 3.11.4`.
///
/// # Errors
/// Returns an error when the environment has no interpreter or it cannot be
/// run successfully.
pub async fn python_name(env_dir: &Path) -> Result<String, DriverError> {
    let executable = python_executable_path(env_dir)?;
    let argv = vec![
        executable.to_string_lossy().into_owned(),
        "--version".to_string(),
    ];
    let captured = run_captured(&argv, Some(VERSION_TIMEOUT)).await?;
    if captured.status != 0 {
        return Err(DriverError::operation_failed(
            "query the interpreter version",
            format!("{}: {}", argv.join(" "), captured.diagnostic()),
        ));
    }
    trace!("{} --version: {:?}", executable.display(), captured.stdout);

    // Interpreters before 3.4 print the version on stderr.
    let output = if captured.stdout.trim().is_empty() {
        &captured.stderr
    } else {
        &captured.stdout
    };
    output
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .ok_or_else(|| {
            DriverError::operation_failed(
                "query the interpreter version",
                format!("{} --version printed nothing", executable.display()),
            )
        })
}

/// Version of the interpreter in the environment, such as `3.11.4`.
///
/// `pyvenv.cfg` is consulted first; the interpreter is only run when the
/// file does not record a version.
///
/// # Errors
/// See [`python_name`].
pub async fn python_version(env_dir: &Path) -> Result<String, DriverError> {
    if let Some(version) = read_pyvenv_config(env_dir, "version_info")
        .or_else(|| read_pyvenv_config(env_dir, "version"))
        .filter(|version| !version.is_empty())
    {
        debug!("{} records version {version}", env_dir.display());
        return Ok(version);
    }
    let name = python_name(env_dir).await?;
    Ok(name
        .split_whitespace()
        .last()
        .unwrap_or(name.as_str())
        .to_string())
}

/// Whether `actual` satisfies `required`, comparing only the dot-separated
/// components both versions have, so `3.7.4` is compatible with `3.7`.
#[must_use]
pub fn compatible_versions(actual: &str, required: &str) -> bool {
    actual
        .split('.')
        .zip(required.split('.'))
        .all(|(actual, required)| actual == required)
}
