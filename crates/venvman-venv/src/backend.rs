use async_trait::async_trait;
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

use venvman_backend::{
    CreateOptions, Driver, DriverError, DriverIdentity, PackageDirective, has_pyvenv_config,
    normalize_names, require_listed, require_name, venv_python_path,
};
use venvman_shell::run_captured;

use crate::interpreter::{find_default_interpreter, find_interpreter};

pub const DRIVER_NAME: &str = "venv";

/// Driver built on the standard library `venv` module.
///
/// Environments are the sub-directories of the workon home that contain a
/// `pyvenv.cfg` file. No shell is involved.
#[derive(Debug, Clone)]
pub struct VenvDriver {
    identity: DriverIdentity,
    workon_home: PathBuf,
    default_python: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl VenvDriver {
    #[must_use]
    pub fn new(workon_home: PathBuf, timeout: Option<Duration>) -> Self {
        Self {
            identity: DriverIdentity::driver(DRIVER_NAME),
            workon_home,
            default_python: None,
            timeout,
        }
    }

    /// Use `python` instead of searching `PATH` when no interpreter is
    /// requested.
    #[must_use]
    pub fn with_default_python(mut self, python: PathBuf) -> Self {
        self.default_python = Some(python);
        self
    }

    #[must_use]
    pub fn workon_home(&self) -> &Path {
        &self.workon_home
    }

    fn default_interpreter(&self) -> Option<PathBuf> {
        self.default_python.clone().or_else(find_default_interpreter)
    }

    fn interpreter(&self, options: &CreateOptions) -> Result<PathBuf, DriverError> {
        let found = match &options.python {
            Some(selector) => find_interpreter(selector),
            None => self.default_interpreter(),
        };
        found.ok_or_else(|| {
            DriverError::interpreter_not_found(
                options.python.as_deref().unwrap_or("default"),
                "no such interpreter file or executable on PATH",
            )
        })
    }

    async fn ensure_workon_home(&self) -> Result<(), DriverError> {
        match tokio::fs::metadata(&self.workon_home).await {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(self.workon_home_not_a_directory()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("creating {}", self.workon_home.display());
                tokio::fs::create_dir_all(&self.workon_home).await?;
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    fn workon_home_not_a_directory(&self) -> DriverError {
        DriverError::operation_failed(
            "use the virtual environment directory",
            format!("{} is not a directory", self.workon_home.display()),
        )
    }

    async fn run(&self, argv: &[String], operation: &'static str) -> Result<(), DriverError> {
        let captured = run_captured(argv, self.timeout).await?;
        if captured.status != 0 {
            error!("{} failed with status {}", argv.join(" "), captured.status);
            return Err(DriverError::operation_failed(operation, captured.diagnostic()));
        }
        Ok(())
    }
}

/// Arguments for `python -m venv`.
fn venv_args(python: &Path, env_dir: &Path, options: &CreateOptions) -> Vec<String> {
    let mut argv = vec![
        python.to_string_lossy().into_owned(),
        "-m".to_string(),
        "venv".to_string(),
        env_dir.to_string_lossy().into_owned(),
    ];
    if options.system_site_packages {
        argv.push("--system-site-packages".to_string());
    }
    match options.pip {
        PackageDirective::DoNotInstall => argv.push("--without-pip".to_string()),
        PackageDirective::Latest => argv.push("--upgrade-deps".to_string()),
        PackageDirective::Bundled | PackageDirective::Exact(_) => {}
    }
    argv
}

/// Reject bootstrap directives that `python -m venv` followed by pip cannot
/// honour.
fn check_bootstrap(options: &CreateOptions) -> Result<(), DriverError> {
    let without_pip = options.pip == PackageDirective::DoNotInstall;
    if without_pip && (!options.packages.is_empty() || options.requirements_file.is_some()) {
        return Err(DriverError::invalid_argument(
            "Packages cannot be installed into a venv created without pip",
        ));
    }
    for (package, directive) in [("setuptools", &options.setuptools), ("wheel", &options.wheel)] {
        match directive {
            PackageDirective::Bundled => {
                return Err(DriverError::invalid_argument(format!(
                    "The venv driver has no bundled {package} to seed"
                )));
            }
            PackageDirective::Latest | PackageDirective::Exact(_) if without_pip => {
                return Err(DriverError::invalid_argument(format!(
                    "{package} cannot be installed into a venv created without pip"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn pip_args(env_dir: &Path, subcommand: &str) -> Vec<String> {
    vec![
        venv_python_path(env_dir).to_string_lossy().into_owned(),
        "-m".to_string(),
        "pip".to_string(),
        subcommand.to_string(),
    ]
}

/// Arguments for the `pip install` run after creation, if one is needed.
///
/// `--upgrade-deps` already covers pip itself, so only setuptools and wheel
/// are upgraded here.
fn pip_install_args(env_dir: &Path, options: &CreateOptions) -> Option<Vec<String>> {
    let mut upgrade = false;
    let mut requirements = Vec::new();
    for (package, directive) in options.bootstrap() {
        match directive {
            PackageDirective::Latest if package != "pip" => {
                upgrade = true;
                requirements.push(package.to_string());
            }
            _ => requirements.extend(directive.pinned_requirement(package, "==")),
        }
    }
    requirements.extend(options.packages.iter().cloned());
    if let Some(file) = &options.requirements_file {
        requirements.push("-r".to_string());
        requirements.push(file.to_string_lossy().into_owned());
    }
    if requirements.is_empty() {
        return None;
    }

    let mut argv = pip_args(env_dir, "install");
    if upgrade {
        argv.push("--upgrade".to_string());
    }
    argv.extend(requirements);
    Some(argv)
}

/// Arguments for the `pip uninstall` run removing the bootstrap packages
/// that were asked not to be installed.
fn pip_uninstall_args(env_dir: &Path, options: &CreateOptions) -> Option<Vec<String>> {
    if options.pip == PackageDirective::DoNotInstall {
        return None;
    }
    let unwanted: Vec<String> = [("setuptools", &options.setuptools), ("wheel", &options.wheel)]
        .into_iter()
        .filter(|(_, directive)| **directive == PackageDirective::DoNotInstall)
        .map(|(package, _)| package.to_string())
        .collect();
    if unwanted.is_empty() {
        return None;
    }

    let mut argv = pip_args(env_dir, "uninstall");
    argv.push("--yes".to_string());
    argv.extend(unwanted);
    Some(argv)
}

#[async_trait]
impl Driver for VenvDriver {
    fn identity(&self) -> &DriverIdentity {
        &self.identity
    }

    fn uses_shell(&self) -> bool {
        false
    }

    async fn check_availability(&self) -> Result<(), DriverError> {
        let unavailable = |reason: String| {
            DriverError::implementation_not_found(format!(
                "No implementation for {DRIVER_NAME} ; {reason}"
            ))
        };
        if self.default_interpreter().is_none() {
            return Err(unavailable(
                "neither python3 nor python is on PATH".to_string(),
            ));
        }
        self.list_environments()
            .await
            .map(|_| ())
            .map_err(|error| unavailable(error.to_string()))
    }

    async fn list_environments(&self) -> Result<Vec<String>, DriverError> {
        let mut entries = match tokio::fs::read_dir(&self.workon_home).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(_) if self.workon_home.exists() && !self.workon_home.is_dir() => {
                return Err(self.workon_home_not_a_directory());
            }
            Err(error) => return Err(error.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() && has_pyvenv_config(&path) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(normalize_names(names))
    }

    async fn create_environment(
        &self,
        name: &str,
        options: &CreateOptions,
    ) -> Result<Option<PathBuf>, DriverError> {
        require_name(name, "create_environment")?;
        if options.project_path.is_some() {
            return Err(DriverError::invalid_argument(
                "Project path not supported for the venv driver",
            ));
        }
        check_bootstrap(options)?;
        if self.list_environments().await?.iter().any(|existing| existing == name) {
            return Err(DriverError::operation_failed(
                "create virtual environment",
                format!("{name} already exists in {}", self.workon_home.display()),
            ));
        }

        let python = self.interpreter(options)?;
        self.ensure_workon_home().await?;
        let env_dir = self.workon_home.join(name);
        info!("Creating virtual environment {name} at {}", env_dir.display());

        self.run(&venv_args(&python, &env_dir, options), "create virtual environment")
            .await?;

        let follow_up = [
            pip_install_args(&env_dir, options).map(|argv| (argv, "install packages")),
            pip_uninstall_args(&env_dir, options).map(|argv| (argv, "remove bootstrap packages")),
        ];
        for (argv, operation) in follow_up.into_iter().flatten() {
            if let Err(error) = self.run(&argv, operation).await {
                error!("Discarding {name} after a failed pip run");
                if let Err(cleanup) = tokio::fs::remove_dir_all(&env_dir).await {
                    error!("Could not remove {}: {cleanup}", env_dir.display());
                }
                return Err(error);
            }
        }

        if !self.list_environments().await?.iter().any(|existing| existing == name) {
            return Err(DriverError::operation_failed(
                "create virtual environment",
                format!(
                    "{name} is not listed in {} after creation",
                    self.workon_home.display()
                ),
            ));
        }
        Ok(Some(env_dir))
    }

    async fn remove_environment(&self, name: &str) -> Result<(), DriverError> {
        let env_dir = self.resolve_environment(name).await?;
        info!("Removing virtual environment {name} at {}", env_dir.display());
        tokio::fs::remove_dir_all(&env_dir).await?;
        if self.list_environments().await?.iter().any(|existing| existing == name) {
            return Err(DriverError::operation_failed(
                "remove virtual environment",
                format!("{name} is still listed after removal"),
            ));
        }
        Ok(())
    }

    async fn resolve_environment(&self, name: &str) -> Result<PathBuf, DriverError> {
        require_name(name, "resolve_environment")?;
        require_listed(name, &self.list_environments().await?)?;
        Ok(self.workon_home.join(name))
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use venvman_backend::{CreateOptions, DriverError, PackageDirective};

    use super::{check_bootstrap, pip_install_args, pip_uninstall_args, venv_args};

    #[test]
    fn venv_args_upgrade_deps_by_default() {
        let argv = venv_args(
            Path::new("/usr/bin/python3"),
            Path::new("/envs/env1"),
            &CreateOptions::default(),
        );

        assert_eq!(
            argv,
            vec!["/usr/bin/python3", "-m", "venv", "/envs/env1", "--upgrade-deps"]
        );
    }

    #[test]
    fn venv_args_without_pip() {
        let options = CreateOptions {
            system_site_packages: true,
            pip: PackageDirective::DoNotInstall,
            ..CreateOptions::default()
        };

        let argv = venv_args(Path::new("python3"), Path::new("/envs/env1"), &options);

        assert_eq!(
            &argv[4..],
            &["--system-site-packages".to_string(), "--without-pip".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn latest_setuptools_and_wheel_are_upgraded_by_default() {
        let argv = pip_install_args(Path::new("/envs/env1"), &CreateOptions::default())
            .expect("setuptools and wheel need a pip run");

        assert_eq!(
            argv,
            vec![
                "/envs/env1/bin/python",
                "-m",
                "pip",
                "install",
                "--upgrade",
                "setuptools",
                "wheel",
            ]
        );
        assert_eq!(
            pip_uninstall_args(Path::new("/envs/env1"), &CreateOptions::default()),
            None
        );
    }

    #[test]
    fn nothing_to_install_skips_pip() {
        let options = CreateOptions {
            pip: PackageDirective::Bundled,
            setuptools: PackageDirective::DoNotInstall,
            wheel: PackageDirective::DoNotInstall,
            ..CreateOptions::default()
        };

        assert_eq!(pip_install_args(Path::new("/envs/env1"), &options), None);
    }

    #[cfg(unix)]
    #[test]
    fn pins_packages_and_requirements_share_one_pip_run() {
        let options = CreateOptions {
            packages: vec!["requests".to_string()],
            requirements_file: Some(PathBuf::from("/src/requirements.txt")),
            pip: PackageDirective::Exact("23.1".to_string()),
            wheel: PackageDirective::Exact("0.41.0".to_string()),
            ..CreateOptions::default()
        };

        let argv = pip_install_args(Path::new("/envs/env1"), &options).expect("pip run needed");

        assert_eq!(
            argv,
            vec![
                "/envs/env1/bin/python",
                "-m",
                "pip",
                "install",
                "--upgrade",
                "pip==23.1",
                "setuptools",
                "wheel==0.41.0",
                "requests",
                "-r",
                "/src/requirements.txt",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn unwanted_bootstrap_packages_are_uninstalled() {
        let options = CreateOptions {
            setuptools: PackageDirective::DoNotInstall,
            wheel: PackageDirective::DoNotInstall,
            ..CreateOptions::default()
        };

        let argv = pip_uninstall_args(Path::new("/envs/env1"), &options)
            .expect("pip uninstall needed");

        assert_eq!(
            argv,
            vec![
                "/envs/env1/bin/python",
                "-m",
                "pip",
                "uninstall",
                "--yes",
                "setuptools",
                "wheel",
            ]
        );
    }

    #[test]
    fn bootstrap_directives_venv_cannot_honour_are_rejected() {
        let bundled_wheel = CreateOptions {
            wheel: PackageDirective::Bundled,
            ..CreateOptions::default()
        };
        let no_pip_but_setuptools = CreateOptions {
            pip: PackageDirective::DoNotInstall,
            setuptools: PackageDirective::Exact("68.0.0".to_string()),
            wheel: PackageDirective::DoNotInstall,
            ..CreateOptions::default()
        };
        let no_pip_but_latest_wheel = CreateOptions {
            pip: PackageDirective::DoNotInstall,
            setuptools: PackageDirective::DoNotInstall,
            ..CreateOptions::default()
        };
        let bare = CreateOptions {
            pip: PackageDirective::DoNotInstall,
            setuptools: PackageDirective::DoNotInstall,
            wheel: PackageDirective::DoNotInstall,
            ..CreateOptions::default()
        };

        assert!(matches!(
            check_bootstrap(&bundled_wheel),
            Err(DriverError::InvalidArgument(ref message)) if message.contains("bundled wheel")
        ));
        assert!(matches!(
            check_bootstrap(&no_pip_but_setuptools),
            Err(DriverError::InvalidArgument(ref message)) if message.starts_with("setuptools")
        ));
        assert!(matches!(
            check_bootstrap(&no_pip_but_latest_wheel),
            Err(DriverError::InvalidArgument(ref message)) if message.starts_with("wheel")
        ));
        assert!(check_bootstrap(&bare).is_ok());
        assert!(check_bootstrap(&CreateOptions::default()).is_ok());
        assert_eq!(pip_uninstall_args(Path::new("/envs/env1"), &bare), None);
    }
}
