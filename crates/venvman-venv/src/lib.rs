mod backend;
mod interpreter;
mod provider;

pub use backend::{DRIVER_NAME, VenvDriver};
pub use interpreter::{DEFAULT_INTERPRETERS, find_default_interpreter, find_interpreter};
pub use provider::VenvProvider;
