//! Config subcommand for the satpy CLI
//!
//! Prints the merged configuration as YAML.

use crate::config::{ConfigStore, global};
use anyhow::{Context, Result};
use clap::Args;

/// Arguments for the config subcommand
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Dotted key to print (default: everything)
    pub key: Option<String>,
}

/// YAML text for `key`, or for the whole store.
pub fn config_output(store: &ConfigStore, key: Option<&str>) -> Result<String> {
    let value = match key {
        Some(key) => store.require(key)?,
        None => store.snapshot(),
    };
    serde_yaml::to_string(&value).context("Failed to serialize configuration")
}

/// Run the config command.
pub fn run_config(args: &ConfigArgs) -> Result<()> {
    print!("{}", config_output(global(), args.key.as_deref())?);
    Ok(())
}
