//! CLI command definitions
//!
//! Defines the clap commands for the inspector CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a test suite and print a report
    Run {
        /// Path to the suite file (.yaml, .yml or .json)
        suite: PathBuf,

        /// Run cases in parallel batches of N (config default when N is omitted)
        #[arg(long, short = 'p', value_name = "N", num_args = 0..=1)]
        parallel: Option<Option<usize>>,

        /// Write the JSON report to this path
        #[arg(long, short = 'r', value_name = "PATH")]
        report: Option<PathBuf>,

        /// Configuration file (default: platform config directory)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Load and build a suite without running it
    Validate {
        /// Path to the suite file
        suite: PathBuf,

        /// Configuration file (default: platform config directory)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Write the sample BMS suite
    Sample {
        /// Destination; the extension selects YAML or JSON
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// List device classes and the functions their drivers accept
    Drivers,
}
