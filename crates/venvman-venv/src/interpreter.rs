use log::debug;
use std::path::{Path, PathBuf};

/// Interpreters tried, in order, when no selector is given.
pub const DEFAULT_INTERPRETERS: &[&str] = &["python3", "python"];

/// Resolve an interpreter selector: an existing file is taken as is,
/// anything else is looked up on `PATH`.
#[must_use]
pub fn find_interpreter(selector: &str) -> Option<PathBuf> {
    let candidate = Path::new(selector);
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    let found = which::which(selector).ok();
    debug!("interpreter {selector} = {found:?}");
    found
}

#[must_use]
pub fn find_default_interpreter() -> Option<PathBuf> {
    DEFAULT_INTERPRETERS
        .iter()
        .find_map(|name| which::which(name).ok())
}
