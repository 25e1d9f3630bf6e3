//! Check subcommand for the satpy CLI
//!
//! Parses every discovered reader and writer configuration and probes the
//! optional shared libraries, then prints a report.

use crate::diagnostics::check_satpy;
use clap::Args;

/// Arguments for the check subcommand
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Comma-separated list of readers to check (default: all)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub readers: Option<Vec<String>>,

    /// Comma-separated list of writers to check (default: all)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub writers: Option<Vec<String>>,

    /// Comma-separated list of shared libraries to probe (default: gdal,proj)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub extras: Option<Vec<String>>,
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) {
    check_satpy(
        args.readers.as_deref(),
        args.writers.as_deref(),
        args.extras.as_deref(),
    );
}
