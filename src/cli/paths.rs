//! Paths subcommand for the satpy CLI
//!
//! Shows the configuration lookup for one file name.

use crate::config::PathResolver;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the paths subcommand
#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Configuration file name, e.g. `readers/abi_l1b.yaml`
    pub filename: String,

    /// List every candidate location, existing or not
    #[arg(long)]
    pub all: bool,
}

/// Lines printed by the paths command, lowest priority first.
///
/// Without `--all` only existing files are listed and the one that would be
/// used is marked with `*`.
pub fn paths_output(resolver: &PathResolver, args: &PathsArgs) -> Vec<String> {
    let paths = resolver.search_paths(&args.filename, !args.all);
    if args.all {
        return paths.iter().map(|path| path.display().to_string()).collect();
    }
    let selected: Option<PathBuf> = paths.last().cloned();
    paths
        .iter()
        .map(|path| {
            let marker = if Some(path) == selected.as_ref() { "*" } else { " " };
            format!("{} {}", marker, path.display())
        })
        .collect()
}

/// Run the paths command.
pub fn run_paths(args: &PathsArgs) {
    let lines = paths_output(&PathResolver::from_global(), args);
    if lines.is_empty() {
        println!("No configuration found for '{}'.", args.filename);
        return;
    }
    for line in lines {
        println!("{}", line);
    }
}
