mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use evalgate_core::config::EVALGATE_LOG_ENV;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::commands::GateOutcome;

const FATAL_EXIT_CODE: u8 = 2;

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let operation = cli.command.name();
    match commands::run(cli.command) {
        Ok(GateOutcome::Passed) => ExitCode::SUCCESS,
        Ok(GateOutcome::Failed) => ExitCode::FAILURE,
        Err(err) => {
            commands::report_fatal(operation, &err);
            ExitCode::from(FATAL_EXIT_CODE)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(EVALGATE_LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
