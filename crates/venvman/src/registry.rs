use log::{debug, warn};
use std::sync::Arc;

use venvman_backend::{DRIVER_KIND, DRIVER_NAMESPACE, Driver, DriverError, DriverProvider};
use venvman_conda::CondaProvider;
use venvman_platform::Settings;
use venvman_pyenv::PyenvVirtualenvProvider;
use venvman_venv::VenvProvider;
use venvman_wrapper::{VirtualenvShProvider, VirtualenvWrapperProvider};

/// Drivers known to this process, in registration order.
#[derive(Clone, Default)]
pub struct Registry {
    providers: Vec<Arc<dyn DriverProvider>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every driver shipped with venvman.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(VirtualenvWrapperProvider::new()));
        registry.register(Arc::new(VirtualenvShProvider::new()));
        registry.register(Arc::new(PyenvVirtualenvProvider::new()));
        registry.register(Arc::new(CondaProvider::new()));
        registry.register(Arc::new(VenvProvider::new()));
        registry
    }

    #[must_use]
    pub fn namespace(&self) -> &'static str {
        DRIVER_NAMESPACE
    }

    /// Add `provider` under its name. A name that is already taken keeps
    /// its first provider and `false` is returned.
    pub fn register(&mut self, provider: Arc<dyn DriverProvider>) -> bool {
        if self.provider(provider.name()).is_some() {
            warn!("A {DRIVER_KIND} named {} is already registered", provider.name());
            return false;
        }
        debug!("registered {}", provider.identity());
        self.providers.push(provider);
        true
    }

    /// Registered names, without instantiating anything.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Names of the drivers that work without any external tool.
    #[must_use]
    pub fn fallback_names(&self) -> Vec<&'static str> {
        self.providers
            .iter()
            .filter(|provider| provider.is_universal_fallback())
            .map(|provider| provider.name())
            .collect()
    }

    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&Arc<dyn DriverProvider>> {
        self.providers.iter().find(|provider| provider.name() == name)
    }

    /// Construct exactly the named driver and check that it works.
    ///
    /// # Errors
    /// Returns [`DriverError::NoSuchDriver`] listing the registered names
    /// when `name` is unknown, otherwise whatever instantiation reports.
    pub async fn instantiate(
        &self,
        name: &str,
        settings: &Settings,
    ) -> Result<Box<dyn Driver>, DriverError> {
        let Some(provider) = self.provider(name) else {
            return Err(DriverError::NoSuchDriver {
                kind: DRIVER_KIND,
                name: name.to_string(),
                available: self.names().into_iter().map(str::to_string).collect(),
            });
        };
        provider.instantiate(settings).await
    }
}
