use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static DESTINATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dest=([^,]+)").expect("destination regex is valid"));

static MISSING_INTERPRETER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"failed to find interpreter|\(from --python=.*\) does not exist")
        .expect("interpreter regex is valid")
});

/// The environment directory `virtualenv` reports in its `creator` line.
#[must_use]
pub fn find_destination(output: &str) -> Option<PathBuf> {
    output.lines().find_map(|line| {
        DESTINATION_RE
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|dest| PathBuf::from(dest.as_str().trim()))
    })
}

#[must_use]
pub fn mentions_missing_interpreter(output: &str) -> bool {
    MISSING_INTERPRETER_RE.is_match(output)
}
