mod backend;
mod flavor;
mod output;
mod provider;

pub use backend::WrapperDriver;
pub use flavor::{VIRTUALENV_SH, VIRTUALENVWRAPPER, WrapperFlavor};
pub use output::{find_destination, mentions_missing_interpreter};
pub use provider::{VirtualenvShProvider, VirtualenvWrapperProvider};
