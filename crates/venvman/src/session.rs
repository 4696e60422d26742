use log::{info, warn};
use std::future::Future;
use std::path::PathBuf;

use venvman_backend::{CreateOptions, Driver, DriverError};
use venvman_platform::{Settings, SettingsError};
use venvman_shell::{CommandResult, ShellRunner};

use crate::interpreter::{compatible_versions, python_version};
use crate::registry::Registry;
use crate::resolver::DriverResolver;

/// Entry point for managing virtual environments with whichever driver
/// works on this machine.
///
/// The driver is chosen on first use and kept for the life of the session.
pub struct Session {
    resolver: DriverResolver,
}

impl Session {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self::with_registry(Registry::builtin(), settings)
    }

    #[must_use]
    pub fn with_registry(registry: Registry, settings: Settings) -> Self {
        Self {
            resolver: DriverResolver::new(registry, settings),
        }
    }

    /// A session configured from the process environment.
    ///
    /// # Errors
    /// Returns an error when a configuration variable is malformed.
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self::new(Settings::from_env()?))
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        self.resolver.settings()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        self.resolver.registry()
    }

    /// Driver names in the order they would be tried.
    #[must_use]
    pub fn candidates(&self) -> Vec<String> {
        self.resolver.candidates()
    }

    /// # Errors
    /// Returns [`DriverError::ImplementationNotFound`] when no driver works.
    pub async fn driver(&self) -> Result<&dyn Driver, DriverError> {
        self.resolver.resolve().await
    }

    /// # Errors
    /// See [`Session::driver`].
    pub async fn driver_name(&self) -> Result<&'static str, DriverError> {
        Ok(self.driver().await?.name())
    }

    pub async fn has_working_driver(&self) -> bool {
        match self.driver().await {
            Ok(_) => true,
            Err(error) if error.is_implementation_not_found() => false,
            Err(error) => {
                warn!("Driver selection failed: {error}");
                false
            }
        }
    }

    /// Run only the shell setup step, with its output visible.
    ///
    /// # Errors
    /// Returns an error when the shell cannot be found or started.
    pub async fn check_environment(&self) -> Result<CommandResult, DriverError> {
        let runner = ShellRunner::new(self.settings().shell.clone());
        Ok(runner.check_setup().await?)
    }

    /// # Errors
    /// Propagates driver selection and listing failures.
    pub async fn list_environments(&self) -> Result<Vec<String>, DriverError> {
        self.driver().await?.list_environments().await
    }

    /// # Errors
    /// Propagates driver selection and creation failures.
    pub async fn create_environment(
        &self,
        name: &str,
        options: &CreateOptions,
    ) -> Result<Option<PathBuf>, DriverError> {
        self.driver().await?.create_environment(name, options).await
    }

    /// # Errors
    /// Propagates driver selection and removal failures.
    pub async fn remove_environment(&self, name: &str) -> Result<(), DriverError> {
        self.driver().await?.remove_environment(name).await
    }

    /// # Errors
    /// Propagates driver selection and resolution failures.
    pub async fn resolve_environment(&self, name: &str) -> Result<PathBuf, DriverError> {
        self.driver().await?.resolve_environment(name).await
    }

    /// Make sure an environment called `name` exists, optionally with an
    /// interpreter compatible with `expected_version`, and return its path.
    ///
    /// A missing environment is created with `python<expected_version>`. An
    /// existing one with the wrong version is replaced when `force` is set.
    ///
    /// # Errors
    /// Returns [`DriverError::OperationFailed`] when the shell setup fails or
    /// the version is wrong without `force`, and propagates driver errors.
    pub async fn ensure_environment(
        &self,
        name: &str,
        expected_version: Option<&str>,
        force: bool,
        options: &CreateOptions,
    ) -> Result<Option<PathBuf>, DriverError> {
        let driver = self.driver().await?;
        if driver.uses_shell() {
            let setup = self.check_environment().await?;
            if !setup.success {
                return Err(DriverError::operation_failed(
                    "prepare the shell environment",
                    setup.text,
                ));
            }
        }

        let mut options = options.clone();
        if let Some(version) = expected_version {
            options.python = Some(format!("python{version}"));
        }

        let env_dir = match driver.resolve_environment(name).await {
            Ok(env_dir) => env_dir,
            Err(error) if error.is_not_found() => {
                info!("Virtual environment {name} does not exist yet");
                return create_and_locate(driver, name, &options).await;
            }
            Err(error) => return Err(error),
        };

        let Some(expected) = expected_version else {
            return Ok(Some(env_dir));
        };
        let actual = python_version(&env_dir).await?;
        if compatible_versions(&actual, expected) {
            return Ok(Some(env_dir));
        }

        let message = format!(
            "Virtual environment at {} has actual version {actual}, not expected version {expected}",
            env_dir.display()
        );
        warn!("{message}");
        if !force {
            return Err(DriverError::operation_failed(
                "ensure virtual environment",
                message,
            ));
        }
        info!("Replacing virtual environment {name}");
        driver.remove_environment(name).await?;
        create_and_locate(driver, name, &options).await
    }

    /// Remove `name` if it exists.
    ///
    /// # Errors
    /// Returns [`DriverError::InvalidArgument`] for an empty name and
    /// propagates every failure other than the environment being absent.
    pub async fn discard_environment(&self, name: &str) -> Result<(), DriverError> {
        if name.is_empty() {
            return Err(DriverError::invalid_argument(
                "The name passed to discard_environment cannot be empty",
            ));
        }
        match self.remove_environment(name).await {
            Err(error) if error.is_not_found() => Ok(()),
            other => other,
        }
    }

    /// Ensure the environment, hand its path to `f`, then remove it whether
    /// or not it existed beforehand.
    ///
    /// # Errors
    /// Returns the error from [`Session::ensure_environment`], in which case
    /// `f` is not run, or from removing the environment afterwards.
    pub async fn with_environment<F, Fut, T>(
        &self,
        name: &str,
        expected_version: Option<&str>,
        force: bool,
        options: &CreateOptions,
        f: F,
    ) -> Result<T, DriverError>
    where
        F: FnOnce(Option<PathBuf>) -> Fut,
        Fut: Future<Output = T>,
    {
        let env_dir = self
            .ensure_environment(name, expected_version, force, options)
            .await?;
        let output = f(env_dir).await;
        self.remove_environment(name).await?;
        Ok(output)
    }
}

/// Create `name`, asking the driver for its path when creation does not
/// report one, so that a later `ensure` returns the same path.
async fn create_and_locate(
    driver: &dyn Driver,
    name: &str,
    options: &CreateOptions,
) -> Result<Option<PathBuf>, DriverError> {
    if let Some(env_dir) = driver.create_environment(name, options).await? {
        return Ok(Some(env_dir));
    }
    match driver.resolve_environment(name).await {
        Ok(env_dir) => Ok(Some(env_dir)),
        Err(DriverError::Unsupported { .. }) => Ok(None),
        Err(error) => Err(error),
    }
}
