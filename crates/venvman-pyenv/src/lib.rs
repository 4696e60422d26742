mod backend;
mod provider;

pub use backend::{DRIVER_NAME, PyenvVirtualenvDriver};
pub use provider::PyenvVirtualenvProvider;
