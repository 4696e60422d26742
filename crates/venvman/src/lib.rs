pub mod cli;
pub mod interpreter;
pub mod logging;
mod registry;
mod resolver;
mod session;

pub use registry::Registry;
pub use resolver::{DriverResolver, driver_order};
pub use session::Session;
