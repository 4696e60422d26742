use venvman_backend::{Driver, DriverError, DriverProvider};
use venvman_platform::Settings;

use crate::backend::{DRIVER_NAME, PyenvVirtualenvDriver};

#[derive(Default)]
pub struct PyenvVirtualenvProvider;

impl PyenvVirtualenvProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DriverProvider for PyenvVirtualenvProvider {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn create_driver(&self, settings: &Settings) -> Result<Box<dyn Driver>, DriverError> {
        Ok(Box::new(PyenvVirtualenvDriver::new(settings.shell.clone())))
    }
}
