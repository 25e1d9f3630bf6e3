//! CLI command definitions for satpy
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod check;
pub mod config;
pub mod paths;

use check::CheckArgs;
use clap::{Parser, Subcommand};
use config::ConfigArgs;
use paths::PathsArgs;

/// Satellite imagery configuration and compositing tools
#[derive(Parser, Debug)]
#[command(name = "satpy", author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check reader and writer configs and optional libraries
    Check(CheckArgs),

    /// Show where a configuration file is looked up
    Paths(PathsArgs),

    /// Print the merged configuration, or a single key
    Config(ConfigArgs),
}
