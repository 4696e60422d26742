use std::path::{Path, PathBuf};

pub const PYVENV_CONFIG_FILE: &str = "pyvenv.cfg";

#[must_use]
pub fn pyvenv_config_path(env_dir: &Path) -> PathBuf {
    env_dir.join(PYVENV_CONFIG_FILE)
}

#[must_use]
pub fn has_pyvenv_config(env_dir: &Path) -> bool {
    pyvenv_config_path(env_dir).is_file()
}

/// Where the interpreter of the environment rooted at `env_dir` lives.
#[must_use]
pub fn venv_python_path(env_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        env_dir.join("Scripts").join("python.exe")
    } else {
        env_dir.join("bin").join("python")
    }
}

/// Read a value from the `pyvenv.cfg` file at the root of an environment.
///
/// Returns `None` when the file is missing, unreadable, or has no such key.
#[must_use]
pub fn read_pyvenv_config(env_dir: &Path, key: &str) -> Option<String> {
    let content = std::fs::read_to_string(pyvenv_config_path(env_dir)).ok()?;
    parse_pyvenv_config(&content, key)
}

fn parse_pyvenv_config(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| line.split_once('=').or_else(|| line.split_once(':')))
        .find(|(candidate, _)| candidate.trim().eq_ignore_ascii_case(key))
        .map(|(_, value)| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "home = /usr/local/bin\n\
                          include-system-site-packages = false\n\
                          version = 3.11.4\n\
                          executable = /usr/local/bin/python3.11\n";

    #[cfg(unix)]
    #[test]
    fn venv_python_lives_in_bin() {
        assert_eq!(
            venv_python_path(Path::new("/envs/env1")),
            PathBuf::from("/envs/env1/bin/python")
        );
    }

    #[test]
    fn parse_finds_trimmed_value() {
        assert_eq!(
            parse_pyvenv_config(SAMPLE, "version").as_deref(),
            Some("3.11.4")
        );
        assert_eq!(
            parse_pyvenv_config(SAMPLE, "executable").as_deref(),
            Some("/usr/local/bin/python3.11")
        );
    }

    #[test]
    fn parse_keys_are_case_insensitive() {
        assert_eq!(
            parse_pyvenv_config(SAMPLE, "HOME").as_deref(),
            Some("/usr/local/bin")
        );
    }

    #[test]
    fn parse_missing_key_is_none() {
        assert!(parse_pyvenv_config(SAMPLE, "version_info").is_none());
    }

    #[test]
    fn read_from_environment_directory() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(temp_dir.path().join(PYVENV_CONFIG_FILE), SAMPLE).expect("write config");

        assert!(has_pyvenv_config(temp_dir.path()));
        assert_eq!(
            read_pyvenv_config(temp_dir.path(), "version").as_deref(),
            Some("3.11.4")
        );
    }

    #[test]
    fn read_without_config_file_is_none() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");

        assert!(!has_pyvenv_config(temp_dir.path()));
        assert!(read_pyvenv_config(temp_dir.path(), "version").is_none());
    }
}
