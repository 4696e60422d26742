use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*environment location: (.*)$").expect("location regex is valid")
});

/// Named environments from `conda info --envs`, keyed by name.
///
/// Comment lines and prefixes without a name are skipped; the `*` marking
/// the active environment is ignored.
#[must_use]
pub fn parse_environments(output: &str) -> BTreeMap<String, PathBuf> {
    output
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with('#') && trimmed.len() == line.len()
        })
        .filter_map(|line| {
            let (name, rest) = line.split_once(char::is_whitespace)?;
            let rest = rest.trim_start();
            // The prefix is the rest of the line and may contain spaces.
            let path = rest
                .strip_prefix('*')
                .filter(|after| after.starts_with(char::is_whitespace))
                .map_or(rest, str::trim_start)
                .trim_end();
            (!path.is_empty()).then(|| (name.to_string(), PathBuf::from(path)))
        })
        .collect()
}

/// The `environment location:` line `conda create` prints in its plan.
#[must_use]
pub fn environment_location(output: &str) -> Option<PathBuf> {
    LOCATION_RE
        .captures(output)
        .and_then(|captures| captures.get(1))
        .map(|location| PathBuf::from(location.as_str().trim()))
}
