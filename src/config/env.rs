//! Environment variable handling.
//!
//! Legacy variable names are mapped to their current names by
//! [`migrate_env`], a pure function over an environment snapshot. The store
//! uses it on its own snapshot. Only a binary writes the result back to the
//! process environment, through [`apply_process_migration`] at the top of
//! `main`.

use std::collections::BTreeMap;
use std::sync::Once;
use tracing::warn;

/// Overrides the system-wide root config file (default `/etc/satpy/satpy.yaml`).
pub const ROOT_CONFIG_VAR: &str = "SATPY_ROOT_CONFIG";
/// Colon-separated extra search directories, last listed wins.
pub const CONFIG_PATH_VAR: &str = "SATPY_CONFIG_PATH";
/// Overrides the data directory default.
pub const DATA_DIR_VAR: &str = "SATPY_DATA_DIR";
/// Prefix for all environment variables mapped into the store.
pub const ENV_PREFIX: &str = "SATPY_";

/// Legacy name → current name.
pub const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("PPP_CONFIG_DIR", CONFIG_PATH_VAR),
    ("SATPY_ANCPATH", DATA_DIR_VAR),
];

/// Snapshot of environment variables.
pub type EnvVars = BTreeMap<String, String>;

/// Capture the current process environment.
pub fn process_env() -> EnvVars {
    std::env::vars().collect()
}

/// A single legacy variable that was mapped to its new name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    pub legacy: &'static str,
    pub current: &'static str,
    pub value: String,
}

impl std::fmt::Display for Deprecation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' is deprecated. Please use '{}' instead.",
            self.legacy, self.current
        )
    }
}

/// Result of migrating an environment mapping.
#[derive(Debug, Clone, Default)]
pub struct EnvMigration {
    /// The environment with current names populated.
    pub vars: EnvVars,
    /// Legacy names that were mapped during this migration.
    pub deprecations: Vec<Deprecation>,
}

/// Map legacy variable names to their current names.
///
/// A legacy value is only carried over when the current name is unset, so
/// migrating an already migrated mapping changes nothing.
pub fn migrate_env(vars: &EnvVars) -> EnvMigration {
    let mut migrated = vars.clone();
    let mut deprecations = Vec::new();

    for &(legacy, current) in LEGACY_ALIASES {
        let Some(value) = vars.get(legacy) else {
            continue;
        };
        if vars.contains_key(current) {
            continue;
        }
        migrated.insert(current.to_string(), value.clone());
        deprecations.push(Deprecation {
            legacy,
            current,
            value: value.clone(),
        });
    }

    EnvMigration {
        vars: migrated,
        deprecations,
    }
}

static PROCESS_MIGRATION: Once = Once::new();

/// Migrate legacy names in the process environment, at most once.
///
/// Logs one deprecation warning per migrated variable. This writes the
/// process environment, so call it from `main` before any thread is spawned.
/// The library itself never calls it.
pub fn apply_process_migration() {
    PROCESS_MIGRATION.call_once(|| {
        let migration = migrate_env(&process_env());
        for deprecation in &migration.deprecations {
            warn!("{}", deprecation);
            // SAFETY: only called from the binary's main before any thread
            // is spawned.
            unsafe {
                std::env::set_var(deprecation.current, &deprecation.value);
            }
        }
    });
}

/// Split a colon-separated directory list, dropping empty entries.
pub fn split_search_path(value: &str) -> Vec<String> {
    value
        .split(':')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract `SATPY_*` variables as dotted configuration keys.
///
/// `SATPY_DATA_DIR` becomes `data_dir`, `SATPY_READERS__CHUNKS` becomes
/// `readers.chunks`. `SATPY_CONFIG_PATH` is split into a list. The root
/// config variable only feeds path discovery and is skipped.
pub fn env_overrides(vars: &EnvVars) -> Vec<(String, serde_json::Value)> {
    let mut overrides = Vec::new();
    for (name, raw) in vars {
        let Some(suffix) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        if suffix.is_empty() || name == ROOT_CONFIG_VAR {
            continue;
        }
        let key = suffix.to_lowercase().replace("__", ".");
        let value = if name == CONFIG_PATH_VAR {
            serde_json::Value::from(split_search_path(raw))
        } else {
            parse_env_value(raw)
        };
        overrides.push((key, value));
    }
    overrides
}

/// Interpret an environment value as a YAML literal, falling back to a string.
fn parse_env_value(raw: &str) -> serde_json::Value {
    match serde_yaml::from_str::<serde_json::Value>(raw) {
        Ok(value @ (serde_json::Value::Bool(_)
        | serde_json::Value::Number(_)
        | serde_json::Value::Array(_))) => value,
        _ => serde_json::Value::String(raw.to_string()),
    }
}
