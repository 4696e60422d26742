use async_trait::async_trait;
use log::{debug, error, info};
use std::path::PathBuf;

use venvman_backend::{
    CreateOptions, Driver, DriverError, DriverIdentity, normalize_names, require_listed,
    require_name,
};
use venvman_platform::ShellSettings;
use venvman_shell::{
    COMMAND_NOT_FOUND_STATUS, ShellRunner, SuccessStatuses, ToolCommand,
    remove_interactive_shell_warnings,
};

pub const DRIVER_NAME: &str = "pyenv-virtualenv";

/// Part of the message `pyenv` prints for an unknown Python version.
const NO_SUCH_PYTHON: &str = "is not installed in pyenv";

/// `pyenv` exits with 1 when a subcommand such as `virtualenvs` is unknown.
const UNKNOWN_SUBCOMMAND_STATUS: i32 = 1;

#[derive(Debug, Clone)]
pub struct PyenvVirtualenvDriver {
    identity: DriverIdentity,
    runner: ShellRunner,
    success_statuses: SuccessStatuses,
}

impl PyenvVirtualenvDriver {
    #[must_use]
    pub fn new(shell: ShellSettings) -> Self {
        Self {
            identity: DriverIdentity::driver(DRIVER_NAME),
            runner: ShellRunner::new(shell),
            success_statuses: SuccessStatuses::default(),
        }
    }

    fn make_command(name: &str, options: &CreateOptions) -> Result<ToolCommand, DriverError> {
        if options.project_path.is_some() {
            return Err(DriverError::invalid_argument(
                "pyenv-virtualenv cannot associate a project path",
            ));
        }
        if !options.packages.is_empty() {
            return Err(DriverError::invalid_argument(
                "pyenv-virtualenv cannot install packages on creation",
            ));
        }
        if options.requirements_file.is_some() {
            return Err(DriverError::invalid_argument(
                "pyenv-virtualenv cannot install a requirements file on creation",
            ));
        }

        Ok(ToolCommand::new("pyenv")
            .arg("virtualenv")
            .opt_arg(options.python.as_ref().map(|python| format!("--python={python}")))
            .arg_if(options.system_site_packages, "--system-site-packages")
            .args(
                options
                    .bootstrap()
                    .into_iter()
                    .filter_map(|(package, directive)| directive.seed_flag(package)),
            )
            .arg(name))
    }

    async fn prefix(&self, name: &str) -> Result<PathBuf, DriverError> {
        let command = ToolCommand::new("pyenv").arg("prefix").arg(name);
        let result = self.runner.run(&command, &self.success_statuses).await?;
        let prefix = result.text.trim();
        if !result.success || prefix.is_empty() {
            error!("pyenv prefix {name} failed: {}", result.text);
            return Err(DriverError::operation_failed(
                "get the path of virtual environment",
                format!("{name}: {}", result.text),
            ));
        }
        Ok(PathBuf::from(prefix))
    }
}

#[async_trait]
impl Driver for PyenvVirtualenvDriver {
    fn identity(&self) -> &DriverIdentity {
        &self.identity
    }

    async fn list_environments(&self) -> Result<Vec<String>, DriverError> {
        let command = ToolCommand::new("pyenv").arg("virtualenvs").arg("--bare");
        let result = self.runner.run(&command, &self.success_statuses).await?;
        if result.success {
            // Every environment is also listed as `<version>/envs/<name>`.
            return Ok(normalize_names(
                result
                    .text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.contains('/'))
                    .map(str::to_string),
            ));
        }
        error!("pyenv virtualenvs failed: {}", result.text);
        match result.status {
            COMMAND_NOT_FOUND_STATUS => Err(DriverError::command_not_found(
                "pyenv",
                format!("{}. Have you installed pyenv?", result.text),
            )),
            UNKNOWN_SUBCOMMAND_STATUS => Err(DriverError::command_not_found(
                DRIVER_NAME,
                format!("{}. Have you installed pyenv-virtualenv?", result.text),
            )),
            _ => Err(DriverError::operation_failed(
                "list virtual environments",
                result.text,
            )),
        }
    }

    async fn create_environment(
        &self,
        name: &str,
        options: &CreateOptions,
    ) -> Result<Option<PathBuf>, DriverError> {
        require_name(name, "create_environment")?;
        let command = Self::make_command(name, options)?;
        info!("Creating virtual environment {name} with pyenv-virtualenv");

        let captured = self.runner.run_captured(&command).await?;
        if captured.stdout.contains(NO_SUCH_PYTHON) || captured.stderr.contains(NO_SUCH_PYTHON) {
            return Err(DriverError::interpreter_not_found(
                options.python.as_deref().unwrap_or("default"),
                captured.diagnostic(),
            ));
        }
        if captured.status == COMMAND_NOT_FOUND_STATUS {
            return Err(DriverError::command_not_found("pyenv", captured.diagnostic()));
        }
        if !self.success_statuses.contains(captured.status) {
            error!("pyenv virtualenv {name} failed with status {}", captured.status);
            return Err(DriverError::operation_failed(
                "create virtual environment",
                format!("{name}: {}", captured.diagnostic()),
            ));
        }

        let names = self.list_environments().await?;
        if !names.iter().any(|candidate| candidate == name) {
            return Err(DriverError::operation_failed(
                "create virtual environment",
                format!("{name} is not listed by pyenv virtualenvs after creation"),
            ));
        }

        let path = self.prefix(name).await?;
        debug!("created {name} at {}", path.display());
        Ok(Some(path))
    }

    async fn remove_environment(&self, name: &str) -> Result<(), DriverError> {
        require_name(name, "remove_environment")?;
        require_listed(name, &self.list_environments().await?)?;
        info!("Removing virtual environment {name} with pyenv-virtualenv");

        let command = ToolCommand::new("pyenv").arg("uninstall").arg("-f").arg(name);
        let captured = self.runner.run_captured(&command).await?;
        let stderr = remove_interactive_shell_warnings(&captured.stderr);
        if !self.success_statuses.contains(captured.status) || !stderr.trim().is_empty() {
            error!("pyenv uninstall {name} failed with status {}", captured.status);
            return Err(DriverError::operation_failed(
                "remove virtual environment",
                format!("{name}: {}", captured.diagnostic()),
            ));
        }

        if self
            .list_environments()
            .await?
            .iter()
            .any(|candidate| candidate == name)
        {
            return Err(DriverError::operation_failed(
                "remove virtual environment",
                format!("{name} is still listed after pyenv uninstall"),
            ));
        }
        Ok(())
    }

    async fn resolve_environment(&self, name: &str) -> Result<PathBuf, DriverError> {
        require_name(name, "resolve_environment")?;
        require_listed(name, &self.list_environments().await?)?;
        self.prefix(name).await
    }
}
