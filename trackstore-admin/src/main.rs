//! Track store merge admin binary.
//!
//! Merges a slave track store into a master track store and prints the statistics of the run.
//! Failures are reported with the stage and table in progress. Re-running after fixing the data
//! continues where the failed run stopped.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use trackstore_config::Environment;
use trackstore_telemetry::tracing::init_tracing;

use crate::config::load_admin_config;
use crate::core::{print_plan, run_merge};
use crate::error::{AdminError, AdminResult};

mod config;
mod core;
mod error;
mod report;

/// Reconciles a slave track store into a master track store.
#[derive(Parser, Debug)]
#[command(name = "trackstore-admin")]
#[command(about = "Reconciles a slave track store into a master track store")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merges the slave store into the master store.
    Merge,
    /// Prints the order in which the tables are merged, without connecting to either store.
    Plan,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(category = err.category(), "{err}");
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> AdminResult<()> {
    let config = load_admin_config()?;

    let environment = Environment::load().map_err(AdminError::config)?;
    init_tracing(env!("CARGO_BIN_NAME"), environment).map_err(AdminError::config)?;

    match args.command {
        Command::Plan => print_plan(&config),
        Command::Merge => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(run_merge(config)),
    }
}
