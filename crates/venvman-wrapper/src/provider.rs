use venvman_backend::{Driver, DriverError, DriverProvider};
use venvman_platform::Settings;

use crate::backend::WrapperDriver;
use crate::flavor::{VIRTUALENV_SH, VIRTUALENVWRAPPER};

#[derive(Default)]
pub struct VirtualenvWrapperProvider;

impl VirtualenvWrapperProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DriverProvider for VirtualenvWrapperProvider {
    fn name(&self) -> &'static str {
        VIRTUALENVWRAPPER.name
    }

    fn create_driver(&self, settings: &Settings) -> Result<Box<dyn Driver>, DriverError> {
        Ok(Box::new(WrapperDriver::new(
            VIRTUALENVWRAPPER,
            settings.shell.clone(),
            settings.workon_home.clone(),
        )))
    }
}

#[derive(Default)]
pub struct VirtualenvShProvider;

impl VirtualenvShProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DriverProvider for VirtualenvShProvider {
    fn name(&self) -> &'static str {
        VIRTUALENV_SH.name
    }

    fn create_driver(&self, settings: &Settings) -> Result<Box<dyn Driver>, DriverError> {
        Ok(Box::new(WrapperDriver::new(
            VIRTUALENV_SH,
            settings.shell.clone(),
            settings.workon_home.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use venvman_backend::{DRIVER_KIND, DRIVER_VERSION, DriverProvider};
    use venvman_platform::Settings;

    use super::{VirtualenvShProvider, VirtualenvWrapperProvider};

    fn settings() -> Settings {
        Settings::from_lookup(|name| (name == "WORKON_HOME").then(|| "/tmp/envs".to_string()))
            .expect("valid settings")
    }

    #[test]
    fn provider_names_are_stable() {
        assert_eq!(VirtualenvWrapperProvider::new().name(), "virtualenvwrapper");
        assert_eq!(VirtualenvShProvider::new().name(), "virtualenv-sh");
    }

    #[test]
    fn identity_carries_kind_and_version() {
        let identity = VirtualenvWrapperProvider::new().identity();

        assert_eq!(identity.kind, DRIVER_KIND);
        assert_eq!(identity.version, DRIVER_VERSION);
        assert!(!VirtualenvWrapperProvider::new().is_universal_fallback());
    }

    #[test]
    fn create_driver_forwards_the_provider_name() {
        let driver = VirtualenvShProvider::new()
            .create_driver(&settings())
            .expect("create driver");

        assert_eq!(driver.name(), "virtualenv-sh");
        assert_eq!(driver.identity().name, "virtualenv-sh");
    }

    #[test]
    fn create_driver_uses_workon_home() {
        let settings = settings();

        assert_eq!(settings.workon_home, PathBuf::from("/tmp/envs"));
        assert!(
            VirtualenvWrapperProvider::new()
                .create_driver(&settings)
                .is_ok()
        );
    }
}
