mod error;
mod metadata;
mod traits;
mod types;

pub use error::DriverError;
pub use metadata::{
    PYVENV_CONFIG_FILE, has_pyvenv_config, pyvenv_config_path, read_pyvenv_config,
    venv_python_path,
};
pub use traits::{Driver, DriverProvider, normalize_names, require_listed, require_name};
pub use types::{
    CreateOptions, DRIVER_KIND, DRIVER_NAMESPACE, DRIVER_VERSION, DriverIdentity,
    PackageDirective, PackageDirectiveParseError,
};
