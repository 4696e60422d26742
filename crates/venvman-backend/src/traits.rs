use async_trait::async_trait;
use log::debug;
use std::path::{Component, Path, PathBuf};

use venvman_platform::Settings;

use crate::error::DriverError;
use crate::types::{CreateOptions, DriverIdentity};

/// Factory for one driver family, registered under a stable name.
#[async_trait]
pub trait DriverProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn identity(&self) -> DriverIdentity {
        DriverIdentity::driver(self.name())
    }

    /// A fallback works with nothing beyond the standard library and yields
    /// to every other driver unless a preference says otherwise.
    fn is_universal_fallback(&self) -> bool {
        false
    }

    /// Construct the driver without checking that its tool works.
    ///
    /// # Errors
    /// Returns an error when `settings` cannot describe a usable driver.
    fn create_driver(&self, settings: &Settings) -> Result<Box<dyn Driver>, DriverError>;

    /// Construct the driver and prove that it is usable.
    ///
    /// # Errors
    /// Returns [`DriverError::ImplementationNotFound`] when the tool is not
    /// available, or whatever [`DriverProvider::create_driver`] reports.
    async fn instantiate(&self, settings: &Settings) -> Result<Box<dyn Driver>, DriverError> {
        let driver = self.create_driver(settings)?;
        driver.check_availability().await?;
        debug!("instantiated {}", driver.identity());
        Ok(driver)
    }
}

/// Contract shared by every virtual environment backend.
///
/// A driver is only handed out once [`Driver::check_availability`] has
/// succeeded, so callers never observe a driver whose tool is missing.
#[async_trait]
pub trait Driver: Send + Sync {
    fn identity(&self) -> &DriverIdentity;

    fn name(&self) -> &'static str {
        self.identity().name
    }

    /// Whether the driver runs its tool through the user's shell setup.
    fn uses_shell(&self) -> bool {
        true
    }

    /// Prove that the external tool behind this driver is installed and
    /// responsive.
    ///
    /// Any failure is reported as [`DriverError::ImplementationNotFound`].
    async fn check_availability(&self) -> Result<(), DriverError> {
        match self.list_environments().await {
            Ok(names) => {
                debug!(
                    "{}: availability check listed {} environments",
                    self.name(),
                    names.len()
                );
                Ok(())
            }
            Err(error) => Err(DriverError::implementation_not_found(format!(
                "No implementation for {} ; {error}",
                self.name()
            ))),
        }
    }

    /// Names of the environments managed by this driver, in case-sensitive
    /// order.
    async fn list_environments(&self) -> Result<Vec<String>, DriverError>;

    async fn create_environment(
        &self,
        _name: &str,
        _options: &CreateOptions,
    ) -> Result<Option<PathBuf>, DriverError> {
        Err(DriverError::unsupported(
            format!("the {} driver", self.name()),
            "create_environment",
        ))
    }

    async fn remove_environment(&self, _name: &str) -> Result<(), DriverError> {
        Err(DriverError::unsupported(
            format!("the {} driver", self.name()),
            "remove_environment",
        ))
    }

    async fn resolve_environment(&self, _name: &str) -> Result<PathBuf, DriverError> {
        Err(DriverError::unsupported(
            format!("the {} driver", self.name()),
            "resolve_environment",
        ))
    }
}

/// Reject a name that is empty or is not a single path component, before
/// it reaches an external tool or gets joined onto the workon home.
///
/// # Errors
/// Returns [`DriverError::InvalidArgument`] when `name` is empty, contains a
/// path separator, is `.` or `..`, or is absolute.
pub fn require_name(name: &str, operation: &str) -> Result<(), DriverError> {
    if name.is_empty() {
        return Err(DriverError::invalid_argument(format!(
            "The name passed to {operation} cannot be empty"
        )));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(component)), None) if component.to_str() == Some(name) => Ok(()),
        _ => Err(DriverError::invalid_argument(format!(
            "The name passed to {operation} must be a single directory name, not {name:?}"
        ))),
    }
}

/// Check that `name` is one of `names`.
///
/// # Errors
/// Returns [`DriverError::NotFound`] listing the known names otherwise.
pub fn require_listed(name: &str, names: &[String]) -> Result<(), DriverError> {
    if names.iter().any(|candidate| candidate == name) {
        Ok(())
    } else {
        Err(DriverError::not_found(name, names))
    }
}

/// Sort and de-duplicate environment names as reported by a tool.
#[must_use]
pub fn normalize_names<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut names: Vec<String> = names
        .into_iter()
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}
