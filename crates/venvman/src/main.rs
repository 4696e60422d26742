use clap::Parser;
use std::process::ExitCode;

use venvman::Session;
use venvman::cli::{Cli, CliError, run};
use venvman::logging::init_logging;
use venvman_platform::expand_path;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_file = cli.log_file.as_deref().map(expand_path);
    init_logging(cli.verbose, log_file.as_deref());

    let result = match Session::from_env() {
        Ok(session) => run(cli.command, &session, &mut std::io::stdout()).await,
        Err(error) => Err(CliError::from(error)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::debug!("command failed: {error:?}");
            eprintln!("venvman: {error}");
            ExitCode::FAILURE
        }
    }
}
