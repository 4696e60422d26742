mod backend;
mod envs;
mod provider;

pub use backend::{CondaDriver, DRIVER_NAME};
pub use envs::{environment_location, parse_environments};
pub use provider::CondaProvider;
