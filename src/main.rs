//! Satpy command line
//!
//! Self test, configuration lookup and merged settings for satpy.

use anyhow::Result;
use clap::Parser;
use satpy_core::cli::check::run_check;
use satpy_core::cli::config::run_config;
use satpy_core::cli::paths::run_paths;
use satpy_core::cli::{Cli, Command};
use satpy_core::config::env::apply_process_migration;
use std::fs::OpenOptions;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // Legacy variables must be renamed before anything reads the environment
    apply_process_migration();
    debug!(command = ?cli.command, "Starting satpy");

    match &cli.command {
        Command::Check(args) => run_check(args),
        Command::Paths(args) => run_paths(args),
        Command::Config(args) => run_config(args)?,
    }

    Ok(())
}
