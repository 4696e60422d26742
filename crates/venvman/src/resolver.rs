use log::{debug, error, info, warn};
use std::fmt::Write as _;
use tokio::sync::OnceCell;

use venvman_backend::{Driver, DriverError};
use venvman_platform::Settings;

use crate::registry::Registry;

/// The order in which drivers are tried.
///
/// Preferred names come first, in the order given; names that are not
/// registered are ignored. The remaining registered names follow in
/// registration order. Excluded names are dropped wherever they appear.
/// Without any preference the `fallback` drivers are tried last.
#[must_use]
pub fn driver_order(
    names: &[&str],
    preferred: &[String],
    excluded: &[String],
    fallback: &[&str],
) -> Vec<String> {
    let is_excluded = |name: &str| excluded.iter().any(|excluded| excluded == name);

    let mut order: Vec<String> = Vec::with_capacity(names.len());
    for name in preferred {
        if !names.contains(&name.as_str()) {
            warn!("Ignoring preferred driver {name:?}, which is not registered");
            continue;
        }
        if !order.contains(name) {
            order.push(name.clone());
        }
    }

    let mut tail: Vec<String> = Vec::new();
    for name in names {
        if order.iter().any(|chosen| chosen == name) {
            continue;
        }
        if preferred.is_empty() && fallback.contains(name) {
            tail.push((*name).to_string());
        } else {
            order.push((*name).to_string());
        }
    }
    order.extend(tail);
    order.retain(|name| !is_excluded(name));
    order
}

/// Picks the first driver that works and keeps it for the life of the
/// resolver.
pub struct DriverResolver {
    registry: Registry,
    settings: Settings,
    active: OnceCell<Box<dyn Driver>>,
}

impl DriverResolver {
    #[must_use]
    pub fn new(registry: Registry, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            active: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn candidates(&self) -> Vec<String> {
        driver_order(
            &self.registry.names(),
            &self.settings.preferred_drivers,
            &self.settings.excluded_drivers,
            &self.registry.fallback_names(),
        )
    }

    /// The active driver, selecting it on first use.
    ///
    /// A failed selection is not remembered, so a later call tries again.
    ///
    /// # Errors
    /// Returns [`DriverError::ImplementationNotFound`] naming every candidate
    /// and why it was rejected when none of them works. Any other error from
    /// a candidate ends the search and is returned as is.
    pub async fn resolve(&self) -> Result<&dyn Driver, DriverError> {
        self.active
            .get_or_try_init(|| self.select())
            .await
            .map(|driver| &**driver)
    }

    async fn select(&self) -> Result<Box<dyn Driver>, DriverError> {
        let candidates = self.candidates();
        debug!("driver candidates: {candidates:?}");

        let mut failures: Vec<(String, String)> = Vec::new();
        for name in &candidates {
            match self.registry.instantiate(name, &self.settings).await {
                Ok(driver) => {
                    info!("Using the {name} driver");
                    return Ok(driver);
                }
                Err(error) if error.is_implementation_not_found() => {
                    debug!("{name} is unavailable: {error}");
                    failures.push((name.clone(), error.to_string()));
                }
                Err(error) => {
                    error!("Could not instantiate the {name} driver: {error}");
                    return Err(error);
                }
            }
        }
        Err(DriverError::implementation_not_found(no_driver_message(
            &failures,
        )))
    }
}

fn no_driver_message(failures: &[(String, String)]) -> String {
    let tried = if failures.is_empty() {
        "none".to_string()
    } else {
        failures
            .iter()
            .map(|(name, _)| format!("'{name}'"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut message = format!(
        "No virtualenv driver backed by a working implementation was found. Tried: {tried}.\nReasons:\n"
    );
    for (name, reason) in failures {
        let _ = writeln!(message, "  {name}: {reason}");
    }
    message
}
