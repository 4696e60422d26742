mod commands;
mod paths;
mod settings;

pub use commands::background_command;
pub use paths::{
    DEFAULT_WORKON_DIR_NAME, PathsError, default_setup_file, default_workon_home, expand_path,
};
pub use settings::{
    COMMAND_TIMEOUT_VAR, EXCLUDED_DRIVERS_VAR, FALLBACK_SHELL, HOST_SHELL_VAR,
    INTERACTIVE_SHELL_VAR, PREFERRED_DRIVERS_VAR, SETUP_FILEPATH_VAR, SHELL_VAR, Settings,
    SettingsError, ShellSettings, USE_SETUP_VAR, WORKON_HOME_VAR, parse_bool, split_driver_list,
};
