//! Command line interface of the `venvman` binary.

use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use venvman_backend::{CreateOptions, DriverError, PackageDirective};
use venvman_platform::SettingsError;

use crate::session::Session;

/// Manage Python virtual environments through whichever tool is installed
#[derive(Parser, Debug)]
#[command(name = "venvman")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write debug logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List virtual environment names
    List(ListArgs),

    /// Create a virtual environment
    Create(CreateArgs),

    /// Remove a virtual environment
    Remove(NameArgs),

    /// Print the directory of a virtual environment
    Resolve(NameArgs),

    /// Create a virtual environment unless a compatible one exists
    Ensure(EnsureArgs),

    /// Remove a virtual environment if it exists
    Discard(NameArgs),

    /// Print the name of the driver in use
    Driver,

    /// List registered drivers in the order they are tried
    Drivers,

    /// Run the shell setup step and show its output
    Check,

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Environment name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Environment name
    pub name: String,

    #[command(flatten)]
    pub options: CreateOptionArgs,
}

#[derive(Args, Debug)]
pub struct EnsureArgs {
    /// Environment name
    pub name: String,

    /// Required interpreter version; "3.8" matches "3.8.2"
    #[arg(long = "python-version")]
    pub python_version: Option<String>,

    /// Replace an existing environment with the wrong version
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub options: CreateOptionArgs,
}

#[derive(Args, Debug, Default)]
pub struct CreateOptionArgs {
    /// Interpreter name, path or version
    #[arg(long)]
    pub python: Option<String>,

    /// Project directory to associate with the environment
    #[arg(short = 'a', long)]
    pub project: Option<PathBuf>,

    /// Package to install after creation (repeatable)
    #[arg(short = 'i', long = "package")]
    pub packages: Vec<String>,

    /// Requirements file to install after creation
    #[arg(short, long)]
    pub requirements: Option<PathBuf>,

    /// Give the environment access to the system site packages
    #[arg(long)]
    pub system_site_packages: bool,

    /// pip to seed: latest, none, bundled or a version
    #[arg(long)]
    pub pip: Option<PackageDirective>,

    /// setuptools to seed: latest, none, bundled or a version
    #[arg(long)]
    pub setuptools: Option<PackageDirective>,

    /// wheel to seed: latest, none, bundled or a version
    #[arg(long)]
    pub wheel: Option<PackageDirective>,
}

impl From<CreateOptionArgs> for CreateOptions {
    fn from(args: CreateOptionArgs) -> Self {
        Self {
            python: args.python,
            project_path: args.project,
            packages: args.packages,
            requirements_file: args.requirements,
            system_site_packages: args.system_site_packages,
            pip: args.pip.unwrap_or_default(),
            setuptools: args.setuptools.unwrap_or_default(),
            wheel: args.wheel.unwrap_or_default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Invalid configuration: {0}")]
    Settings(#[from] SettingsError),

    #[error("Shell setup failed with status {status}: {text}")]
    SetupFailed { status: i32, text: String },

    #[error("Could not encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Execute `command` against `session`, writing results to `out`.
///
/// # Errors
/// Returns the first failure of the underlying operation or of writing
/// its output.
pub async fn run<W: Write>(
    command: Commands,
    session: &Session,
    out: &mut W,
) -> Result<(), CliError> {
    match command {
        Commands::List(args) => {
            let names = session.list_environments().await?;
            if args.json {
                writeln!(out, "{}", serde_json::to_string(&names)?)?;
            } else {
                for name in names {
                    writeln!(out, "{name}")?;
                }
            }
        }
        Commands::Create(args) => {
            let options = CreateOptions::from(args.options);
            let created = session.create_environment(&args.name, &options).await?;
            write_optional_path(out, created)?;
        }
        Commands::Remove(args) => session.remove_environment(&args.name).await?,
        Commands::Resolve(args) => {
            let env_dir = session.resolve_environment(&args.name).await?;
            writeln!(out, "{}", env_dir.display())?;
        }
        Commands::Ensure(args) => {
            let options = CreateOptions::from(args.options);
            let ensured = session
                .ensure_environment(
                    &args.name,
                    args.python_version.as_deref(),
                    args.force,
                    &options,
                )
                .await?;
            write_optional_path(out, ensured)?;
        }
        Commands::Discard(args) => session.discard_environment(&args.name).await?,
        Commands::Driver => writeln!(out, "{}", session.driver_name().await?)?,
        Commands::Drivers => {
            let candidates = session.candidates();
            for name in &candidates {
                writeln!(out, "{name}")?;
            }
            for name in session.registry().names() {
                if !candidates.iter().any(|candidate| candidate == name) {
                    writeln!(out, "{name} (excluded)")?;
                }
            }
        }
        Commands::Check => {
            let result = session.check_environment().await?;
            if !result.success {
                return Err(CliError::SetupFailed {
                    status: result.status,
                    text: result.text,
                });
            }
            if !result.text.is_empty() {
                writeln!(out, "{}", result.text)?;
            }
        }
        Commands::Config => {
            writeln!(
                out,
                "{}",
                serde_json::to_string_pretty(session.settings())?
            )?;
        }
    }
    Ok(())
}

fn write_optional_path<W: Write>(out: &mut W, path: Option<PathBuf>) -> std::io::Result<()> {
    match path {
        Some(path) => writeln!(out, "{}", path.display()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use venvman_backend::{CreateOptions, PackageDirective};

    use super::{Cli, Commands};

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from(["venvman", "list", "--json", "-vv", "--log-file", "x.log"])
            .expect("valid arguments");

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_file.as_deref(), Some("x.log"));
        assert!(matches!(cli.command, Commands::List(ref args) if args.json));
    }

    #[test]
    fn create_arguments_become_options() {
        let cli = Cli::try_parse_from([
            "venvman",
            "create",
            "env1",
            "--python",
            "python3.11",
            "-i",
            "requests",
            "--package",
            "attrs",
            "--pip",
            "23.1",
            "--wheel",
            "none",
            "--system-site-packages",
        ])
        .expect("valid arguments");

        let Commands::Create(args) = cli.command else {
            panic!("expected the create subcommand");
        };
        let options = CreateOptions::from(args.options);

        assert_eq!(args.name, "env1");
        assert_eq!(options.python.as_deref(), Some("python3.11"));
        assert_eq!(options.packages, vec!["requests", "attrs"]);
        assert_eq!(options.pip, PackageDirective::Exact("23.1".to_string()));
        assert_eq!(options.setuptools, PackageDirective::Latest);
        assert_eq!(options.wheel, PackageDirective::DoNotInstall);
        assert!(options.system_site_packages);
    }

    #[test]
    fn ensure_takes_version_and_force() {
        let cli = Cli::try_parse_from([
            "venvman",
            "ensure",
            "env1",
            "--python-version",
            "3.11",
            "--force",
        ])
        .expect("valid arguments");

        assert!(matches!(
            cli.command,
            Commands::Ensure(ref args)
                if args.force && args.python_version.as_deref() == Some("3.11")
        ));
    }

    #[test]
    fn name_is_required() {
        assert!(Cli::try_parse_from(["venvman", "remove"]).is_err());
    }
}
