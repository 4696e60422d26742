use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use venvman_backend::{
    CreateOptions, Driver, DriverError, DriverIdentity, normalize_names, require_listed,
    require_name,
};
use venvman_platform::ShellSettings;
use venvman_shell::{
    COMMAND_NOT_FOUND_STATUS, ShellRunner, SuccessStatuses, ToolCommand,
    remove_interactive_shell_warnings,
};

use crate::flavor::WrapperFlavor;
use crate::output::{find_destination, mentions_missing_interpreter};

/// Driver for `virtualenvwrapper` style shell functions.
#[derive(Debug, Clone)]
pub struct WrapperDriver {
    identity: DriverIdentity,
    flavor: WrapperFlavor,
    runner: ShellRunner,
    success_statuses: SuccessStatuses,
    workon_home: PathBuf,
}

impl WrapperDriver {
    #[must_use]
    pub fn new(flavor: WrapperFlavor, shell: ShellSettings, workon_home: PathBuf) -> Self {
        Self {
            identity: DriverIdentity::driver(flavor.name),
            flavor,
            runner: ShellRunner::new(shell),
            success_statuses: SuccessStatuses::new(flavor.success_statuses),
            workon_home,
        }
    }

    #[must_use]
    pub fn flavor(&self) -> WrapperFlavor {
        self.flavor
    }

    #[must_use]
    pub fn workon_home(&self) -> &Path {
        &self.workon_home
    }

    fn make_command(&self, name: &str, options: &CreateOptions) -> ToolCommand {
        let mut command = ToolCommand::new(self.flavor.make_command).arg(name);
        if let Some(project) = &options.project_path {
            command = command.arg("-a").arg(project.to_string_lossy());
        }
        for package in &options.packages {
            command = command.arg("-i").arg(package.as_str());
        }
        if let Some(requirements) = &options.requirements_file {
            command = command.arg("-r").arg(requirements.to_string_lossy());
        }
        command
            .opt_arg(options.python.as_ref().map(|python| format!("--python={python}")))
            .arg_if(options.system_site_packages, "--system-site-packages")
            .args(
                options
                    .bootstrap()
                    .into_iter()
                    .filter_map(|(package, directive)| directive.seed_flag(package)),
            )
    }
}

#[async_trait]
impl Driver for WrapperDriver {
    fn identity(&self) -> &DriverIdentity {
        &self.identity
    }

    async fn list_environments(&self) -> Result<Vec<String>, DriverError> {
        let command = ToolCommand::new(self.flavor.list_command).arg("-b");
        let result = self.runner.run(&command, &self.success_statuses).await?;
        if result.success {
            return Ok(normalize_names(result.text.lines().map(str::to_string)));
        }
        debug!("{} failed: {}", self.flavor.list_command, result.text);
        if result.status == COMMAND_NOT_FOUND_STATUS {
            return Err(DriverError::command_not_found(
                self.flavor.list_command,
                result.text,
            ));
        }
        Err(DriverError::operation_failed(
            "list virtual environments",
            result.text,
        ))
    }

    async fn create_environment(
        &self,
        name: &str,
        options: &CreateOptions,
    ) -> Result<Option<PathBuf>, DriverError> {
        require_name(name, "create_environment")?;
        let command = self.make_command(name, options);
        info!("Creating virtual environment {name} with {}", self.flavor.name);

        let captured = self.runner.run_captured(&command).await?;
        let combined = format!("{}\n{}", captured.stdout, captured.stderr);
        if mentions_missing_interpreter(&combined) {
            error!("{} could not find the interpreter for {name}", self.flavor.make_command);
            return Err(DriverError::interpreter_not_found(
                options.python.as_deref().unwrap_or("default"),
                captured.diagnostic(),
            ));
        }
        if captured.status == COMMAND_NOT_FOUND_STATUS {
            return Err(DriverError::command_not_found(
                self.flavor.make_command,
                captured.diagnostic(),
            ));
        }
        let status = captured.status;
        let destination = find_destination(&captured.stdout);
        let result = captured.into_result(&self.success_statuses);
        if !result.success {
            error!("{} failed with status {status}", self.flavor.make_command);
            return Err(DriverError::operation_failed(
                "create virtual environment",
                format!("{name}: {}", result.text),
            ));
        }

        let names = self.list_environments().await?;
        if !names.iter().any(|candidate| candidate == name) {
            return Err(DriverError::operation_failed(
                "create virtual environment",
                format!(
                    "{name} is not listed by {} after {} reported success",
                    self.flavor.list_command, self.flavor.make_command
                ),
            ));
        }

        if destination.is_none() {
            warn!("Could not find dest for virtualenv {name:?}");
        }
        Ok(destination)
    }

    async fn remove_environment(&self, name: &str) -> Result<(), DriverError> {
        require_name(name, "remove_environment")?;
        require_listed(name, &self.list_environments().await?)?;
        info!("Removing virtual environment {name} with {}", self.flavor.name);

        let command = ToolCommand::new(self.flavor.remove_command).arg(name);
        let captured = self.runner.run_captured(&command).await?;
        let stderr = remove_interactive_shell_warnings(&captured.stderr);
        if !self.success_statuses.contains(captured.status) || !stderr.trim().is_empty() {
            error!("{} {name} failed with status {}", self.flavor.remove_command, captured.status);
            return Err(DriverError::operation_failed(
                "remove virtual environment",
                format!("{name}: {}", captured.diagnostic()),
            ));
        }

        if self.list_environments().await?.iter().any(|candidate| candidate == name) {
            return Err(DriverError::operation_failed(
                "remove virtual environment",
                format!("{name} is still listed after {}", self.flavor.remove_command),
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
