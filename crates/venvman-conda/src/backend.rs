use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;

use venvman_backend::{
    CreateOptions, Driver, DriverError, DriverIdentity, require_listed, require_name,
};
use venvman_platform::ShellSettings;
use venvman_shell::{
    COMMAND_NOT_FOUND_STATUS, ShellRunner, SuccessStatuses, ToolCommand,
    remove_interactive_shell_warnings,
};

use crate::envs::{environment_location, parse_environments};

pub const DRIVER_NAME: &str = "conda";

const PACKAGES_NOT_FOUND: &str = "PackagesNotFoundError";

#[derive(Debug, Clone)]
pub struct CondaDriver {
    identity: DriverIdentity,
    runner: ShellRunner,
    success_statuses: SuccessStatuses,
}

/// The version part of an interpreter selector, so that `python3.11` and
/// `3.11` both become the conda spec `python=3.11`.
fn python_spec(python: &str) -> Result<String, DriverError> {
    if python.contains('/') || python.contains('\\') {
        return Err(DriverError::invalid_argument(format!(
            "conda cannot create an environment from the interpreter path {python}"
        )));
    }
    let version = python.strip_prefix("python").unwrap_or(python);
    if version.is_empty() {
        Ok("python".to_string())
    } else {
        Ok(format!("python={version}"))
    }
}

impl CondaDriver {
    #[must_use]
    pub fn new(shell: ShellSettings) -> Self {
        Self {
            identity: DriverIdentity::driver(DRIVER_NAME),
            runner: ShellRunner::new(shell),
            success_statuses: SuccessStatuses::default(),
        }
    }

    fn create_command(name: &str, options: &CreateOptions) -> Result<ToolCommand, DriverError> {
        if options.project_path.is_some() {
            return Err(DriverError::invalid_argument(
                "conda cannot associate a project path",
            ));
        }
        if options.system_site_packages {
            return Err(DriverError::invalid_argument(
                "conda environments cannot see the system site packages",
            ));
        }

        let mut command = ToolCommand::new("conda")
            .arg("create")
            .arg("--yes")
            .arg("--name")
            .arg(name)
            .opt_arg(options.python.as_deref().map(python_spec).transpose()?)
            .args(
                options
                    .bootstrap()
                    .into_iter()
                    .filter_map(|(package, directive)| directive.pinned_requirement(package, "=")),
            )
            .args(options.packages.iter().map(String::as_str));
        if let Some(requirements) = &options.requirements_file {
            command = command.arg("--file").arg(requirements.to_string_lossy());
        }
        Ok(command)
    }

    async fn environments(&self) -> Result<BTreeMap<String, PathBuf>, DriverError> {
        let command = ToolCommand::new("conda").arg("info").arg("--envs");
        let result = self.runner.run(&command, &self.success_statuses).await?;
        if result.success {
            return Ok(parse_environments(&result.text));
        }
        error!("conda info --envs failed: {}", result.text);
        if result.status == COMMAND_NOT_FOUND_STATUS {
            return Err(DriverError::command_not_found(
                "conda",
                format!("{}. Have you installed conda?", result.text),
            ));
        }
        Err(DriverError::operation_failed(
            "list virtual environments",
            result.text,
        ))
    }
}

fn names(environments: &BTreeMap<String, PathBuf>) -> Vec<String> {
    environments.keys().cloned().collect()
}

#[async_trait]
impl Driver for CondaDriver {
    fn identity(&self) -> &DriverIdentity {
        &self.identity
    }

    async fn list_environments(&self) -> Result<Vec<String>, DriverError> {
        Ok(names(&self.environments().await?))
    }

    async fn create_environment(
        &self,
        name: &str,
        options: &CreateOptions,
    ) -> Result<Option<PathBuf>, DriverError> {
        require_name(name, "create_environment")?;
        let command = Self::create_command(name, options)?;
        info!("Creating virtual environment {name} with conda");

        let captured = self.runner.run_captured(&command).await?;
        let combined = format!("{}\n{}", captured.stdout, captured.stderr);
        if combined.contains(PACKAGES_NOT_FOUND) && combined.contains("python") {
            return Err(DriverError::interpreter_not_found(
                options.python.as_deref().unwrap_or("default"),
                captured.diagnostic(),
            ));
        }
        if captured.status == COMMAND_NOT_FOUND_STATUS {
            return Err(DriverError::command_not_found("conda", captured.diagnostic()));
        }
        if !self.success_statuses.contains(captured.status) {
            error!("conda create {name} failed with status {}", captured.status);
            return Err(DriverError::operation_failed(
                "create virtual environment",
                format!("{name}: {}", captured.diagnostic()),
            ));
        }

        let environments = self.environments().await?;
        let Some(listed) = environments.get(name) else {
            return Err(DriverError::operation_failed(
                "create virtual environment",
                format!("{name} is not listed by conda info --envs after creation"),
            ));
        };
        match environment_location(&captured.stdout) {
            Some(location) => {
                debug!("Found environment location: {}", location.display());
                Ok(Some(location))
            }
            None => {
                warn!("conda create did not report a location for {name}");
                Ok(Some(listed.clone()))
            }
        }
    }

    async fn remove_environment(&self, name: &str) -> Result<(), DriverError> {
        require_name(name, "remove_environment")?;
        require_listed(name, &self.list_environments().await?)?;
        info!("Removing virtual environment {name} with conda");

        let command = ToolCommand::new("conda")
            .arg("remove")
            .arg("--yes")
            .arg("--name")
            .arg(name)
            .arg("--all");
        let captured = self.runner.run_captured(&command).await?;
        let stderr = remove_interactive_shell_warnings(&captured.stderr);
        if !self.success_statuses.contains(captured.status) || !stderr.trim().is_empty() {
            error!("conda remove {name} failed with status {}", captured.status);
            return Err(DriverError::operation_failed(
                "remove virtual environment",
                format!("{name}: {}", captured.diagnostic()),
            ));
        }

        if self.environments().await?.contains_key(name) {
            return Err(DriverError::operation_failed(
                "remove virtual environment",
                format!("{name} is still listed after conda remove"),
            ));
        }
        Ok(())
    }

    async fn resolve_environment(&self, name: &str) -> Result<PathBuf, DriverError> {
        require_name(name, "resolve_environment")?;
        let environments = self.environments().await?;
        match environments.get(name) {
            Some(path) => Ok(path.clone()),
            None => Err(DriverError::not_found(name, &names(&environments))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use venvman_backend::{CreateOptions, DriverError, PackageDirective};

    use super::{CondaDriver, python_spec};

    #[test]
    fn python_selector_becomes_conda_spec() {
        assert_eq!(python_spec("python3.11"), Ok("python=3.11".to_string()));
        assert_eq!(python_spec("3.10"), Ok("python=3.10".to_string()));
        assert_eq!(python_spec("python"), Ok("python".to_string()));
        assert!(matches!(
            python_spec("/usr/bin/python3"),
            Err(DriverError::InvalidArgument(_))
        ));
    }

    #[test]
    fn create_command_pins_exact_bootstrap_versions_only() {
        let options = CreateOptions {
            python: Some("python3.11".to_string()),
            packages: vec!["numpy".to_string()],
            requirements_file: Some(PathBuf::from("/src/requirements.txt")),
            pip: PackageDirective::Exact("23.1".to_string()),
            setuptools: PackageDirective::DoNotInstall,
            wheel: PackageDirective::Bundled,
            ..CreateOptions::default()
        };

        let rendered = CondaDriver::create_command("env1", &options)
            .expect("supported options")
            .render()
            .expect("render command");

        assert_eq!(
            rendered,
            "conda create --yes --name env1 'python=3.11' 'pip=23.1' numpy \
             --file /src/requirements.txt"
        );
    }

    #[test]
    fn unsupported_options_are_invalid_arguments() {
        let with_project = CreateOptions {
            project_path: Some(PathBuf::from("/src/project")),
            ..CreateOptions::default()
        };
        let with_system_site = CreateOptions {
            system_site_packages: true,
            ..CreateOptions::default()
        };

        for options in [with_project, with_system_site] {
            assert!(matches!(
                CondaDriver::create_command("env1", &options),
                Err(DriverError::InvalidArgument(_))
            ));
        }
    }
}
