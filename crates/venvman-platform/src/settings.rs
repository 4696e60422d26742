use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::paths::{PathsError, default_workon_home, expand_with};

pub const SHELL_VAR: &str = "VENV_MANAGEMENT_SHELL";
pub const INTERACTIVE_SHELL_VAR: &str = "VENV_MANAGEMENT_INTERACTIVE_SHELL";
pub const USE_SETUP_VAR: &str = "VENV_MANAGEMENT_USE_SETUP";
pub const SETUP_FILEPATH_VAR: &str = "VENV_MANAGEMENT_SETUP_FILEPATH";
pub const PREFERRED_DRIVERS_VAR: &str = "VENV_MANAGEMENT_PREFERRED_DRIVERS";
pub const EXCLUDED_DRIVERS_VAR: &str = "VENV_MANAGEMENT_EXCLUDED_DRIVERS";
pub const COMMAND_TIMEOUT_VAR: &str = "VENV_MANAGEMENT_COMMAND_TIMEOUT";
pub const WORKON_HOME_VAR: &str = "WORKON_HOME";
pub const HOST_SHELL_VAR: &str = "SHELL";

pub const FALLBACK_SHELL: &str = "bash";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid truth value {value:?} for {variable}")]
    InvalidBool {
        variable: &'static str,
        value: String,
    },

    #[error("Invalid number of seconds {value:?} for {variable}")]
    InvalidSeconds {
        variable: &'static str,
        value: String,
    },

    #[error(transparent)]
    Paths(#[from] PathsError),
}

/// How tool commands are wrapped in the user's shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellSettings {
    /// Shell name or path, with variables already expanded.
    pub shell: String,
    #[serde(default)]
    pub interactive: bool,
    #[serde(default = "default_true")]
    pub use_setup: bool,
    /// Explicit setup file. `None` means `~/.<shell>rc`.
    #[serde(default)]
    pub setup_file: Option<PathBuf>,
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            shell: FALLBACK_SHELL.to_string(),
            interactive: false,
            use_setup: true,
            setup_file: None,
            command_timeout_secs: None,
        }
    }
}

impl ShellSettings {
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub shell: ShellSettings,

    #[serde(default)]
    pub preferred_drivers: Vec<String>,

    #[serde(default)]
    pub excluded_drivers: Vec<String>,

    pub workon_home: PathBuf,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns an error for malformed boolean or timeout values, or when no
    /// home directory is available to derive defaults from.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// # Errors
    /// See [`Settings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand = |raw: &str| expand_with(raw, &lookup);
        let var = |name: &str| lookup(name).map(|value| expand(&value));

        let shell = var(SHELL_VAR)
            .filter(|value| !value.is_empty())
            .or_else(|| var(HOST_SHELL_VAR).filter(|value| !value.is_empty()))
            .unwrap_or_else(|| FALLBACK_SHELL.to_string());

        let interactive = match var(INTERACTIVE_SHELL_VAR) {
            Some(value) => parse_bool(INTERACTIVE_SHELL_VAR, &value)?,
            None => false,
        };
        let use_setup = match var(USE_SETUP_VAR) {
            Some(value) => parse_bool(USE_SETUP_VAR, &value)?,
            None => true,
        };
        let setup_file = var(SETUP_FILEPATH_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let command_timeout_secs = var(COMMAND_TIMEOUT_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(|value| parse_seconds(COMMAND_TIMEOUT_VAR, &value))
            .transpose()?;

        let workon_home = match var(WORKON_HOME_VAR).filter(|value| !value.is_empty()) {
            Some(value) => PathBuf::from(value),
            None => default_workon_home()?,
        };

        Ok(Self {
            shell: ShellSettings {
                shell,
                interactive,
                use_setup,
                setup_file,
                command_timeout_secs,
            },
            preferred_drivers: var(PREFERRED_DRIVERS_VAR)
                .map(|value| split_driver_list(&value))
                .unwrap_or_default(),
            excluded_drivers: var(EXCLUDED_DRIVERS_VAR)
                .map(|value| split_driver_list(&value))
                .unwrap_or_default(),
            workon_home,
        })
    }
}

/// Interpret the truth values accepted by the configuration variables.
///
/// # Errors
/// Returns [`SettingsError::InvalidBool`] for anything else.
pub fn parse_bool(variable: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(SettingsError::InvalidBool {
            variable,
            value: value.to_string(),
        }),
    }
}

fn parse_seconds(variable: &'static str, value: &str) -> Result<u64, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidSeconds {
            variable,
            value: value.to_string(),
        })
}

#[must_use]
pub fn split_driver_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
