use venvman_backend::{Driver, DriverError, DriverProvider};
use venvman_platform::Settings;

use crate::backend::{DRIVER_NAME, VenvDriver};

#[derive(Default)]
pub struct VenvProvider;

impl VenvProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DriverProvider for VenvProvider {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn is_universal_fallback(&self) -> bool {
        true
    }

    fn create_driver(&self, settings: &Settings) -> Result<Box<dyn Driver>, DriverError> {
        Ok(Box::new(VenvDriver::new(
            settings.workon_home.clone(),
            settings.shell.command_timeout(),
        )))
    }
}
