//! Inspector CLI - test-sequence execution for hardware validation
//!
//! Loads a suite of test cases, runs them against simulated bench
//! instruments and prints a pass/fail report.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use inspector::common::logging;
use inspector::{cli, commands};

#[derive(Parser)]
#[command(name = "inspector", about = "Hardware validation test sequencer")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also log to a file (default location when PATH is omitted)
    #[arg(long, value_name = "PATH", num_args = 0..=1, global = true)]
    log_file: Option<Option<PathBuf>>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_file = match cli.log_file {
        Some(Some(path)) => Some(path),
        Some(None) => logging::default_log_file(),
        None => None,
    };
    let _guard = match logging::init_cli(cli.verbose, log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::debug!(kind = %e.kind(), "Command failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
