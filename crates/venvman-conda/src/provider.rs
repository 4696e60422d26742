use venvman_backend::{Driver, DriverError, DriverProvider};
use venvman_platform::Settings;

use crate::backend::{CondaDriver, DRIVER_NAME};

#[derive(Default)]
pub struct CondaProvider;

impl CondaProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DriverProvider for CondaProvider {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn create_driver(&self, settings: &Settings) -> Result<Box<dyn Driver>, DriverError> {
        Ok(Box::new(CondaDriver::new(settings.shell.clone())))
    }
}
