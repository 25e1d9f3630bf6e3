//! Layered key-value configuration store.
//!
//! Lookups see, from lowest to highest priority:
//! 1. **Defaults** - platform cache/data directories and an empty `config_path`
//! 2. **Files** - every discovered `satpy.yaml` (or fragment directory), merged
//! 3. **Environment** - `SATPY_*` variables
//! 4. **Set** - values written with [`ConfigStore::set`]
//! 5. **Scoped overrides** - frames pushed by [`ConfigStore::scoped`]
//!
//! A null in the file or environment layers means "not specified". A null
//! written with `set` or a scoped override unsets the key until it is
//! replaced or the scope ends.
//!
//! The merged view is rebuilt on every mutation, so reads are a tree lookup.

use super::env::{EnvVars, env_overrides, migrate_env, process_env};
use super::loader::ConfigLoader;
use super::merge::{deep_merge_all, deep_override, get_path, set_path};
use super::paths::{APP_NAME, ConfigPaths};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Default values computed from platform application directories.
pub fn default_values() -> Value {
    let cache_dir = dirs::cache_dir().map(|d| d.join(APP_NAME));
    let data_dir = dirs::data_dir().map(|d| d.join(APP_NAME));
    json!({
        "cache_dir": cache_dir.map(|p| p.to_string_lossy().into_owned()),
        "data_dir": data_dir.map(|p| p.to_string_lossy().into_owned()),
        "config_path": [],
    })
}

/// A scoped override frame.
#[derive(Debug)]
struct Frame {
    id: u64,
    values: Value,
}

#[derive(Debug)]
struct StoreState {
    defaults: Value,
    files: Value,
    env: Value,
    set: Value,
    frames: Vec<Frame>,
    merged: Value,
}

impl StoreState {
    fn rebuild(&mut self) {
        let base = match deep_merge_all([&self.defaults, &self.files, &self.env].into_iter().cloned()) {
            Value::Null => Value::Object(Map::new()),
            merged => merged,
        };
        self.merged = std::iter::once(&self.set)
            .chain(self.frames.iter().map(|frame| &frame.values))
            .cloned()
            .fold(base, deep_override);
    }
}

/// Process-wide configuration values addressed by dotted keys.
#[derive(Debug)]
pub struct ConfigStore {
    state: RwLock<StoreState>,
    next_frame: AtomicU64,
}

impl ConfigStore {
    /// Build a store from explicit layers.
    pub fn new(defaults: Value, files: Value, env: Value) -> Self {
        let mut state = StoreState {
            defaults,
            files,
            env,
            set: Value::Object(Map::new()),
            frames: Vec::new(),
            merged: Value::Null,
        };
        state.rebuild();
        Self {
            state: RwLock::new(state),
            next_frame: AtomicU64::new(0),
        }
    }

    /// Build a store from an environment snapshot: discovered files plus
    /// `SATPY_*` variables over platform defaults.
    ///
    /// Legacy variable names are migrated in the snapshot only, with one
    /// warning each; the process environment is never written.
    pub fn from_env(vars: &EnvVars) -> Self {
        let migration = migrate_env(vars);
        for deprecation in &migration.deprecations {
            warn!("{}", deprecation);
        }
        Self::with_paths(ConfigPaths::discover(&migration.vars), &migration.vars)
    }

    /// Build a store from explicit file locations and environment snapshot.
    pub fn with_paths(paths: ConfigPaths, vars: &EnvVars) -> Self {
        let files = ConfigLoader::load_with_paths(paths).into_merged();
        Self::new(default_values(), files, env_layer(vars))
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value for `key`, or `None` if it is not set in any layer.
    pub fn get(&self, key: &str) -> Option<Value> {
        get_path(&self.read().merged, key)
            .filter(|value| !value.is_null())
            .cloned()
    }

    /// Value for `key`, or `default` if it is not set.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Deserialize the value for `key`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|err| Error::invalid_value(key, err.to_string()))
            })
            .transpose()
    }

    /// Value for `key`, failing if it is not set.
    pub fn require(&self, key: &str) -> Result<Value> {
        self.get(key).ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key` for the rest of the process.
    ///
    /// Setting `Value::Null` unsets the key. Active scoped overrides still
    /// shadow the value until they end.
    pub fn set(&self, key: &str, value: Value) {
        let mut state = self.write();
        set_path(&mut state.set, key, value);
        state.rebuild();
    }

    /// Override keys until the returned guard is dropped.
    ///
    /// Guards nest: an inner scope shadows an outer one, and dropping a guard
    /// removes only its own frame, so prior values (or their absence) come
    /// back exactly, including when the scope unwinds from a panic.
    ///
    /// ```
    /// use satpy_core::config::ConfigStore;
    /// use serde_json::json;
    ///
    /// let store = ConfigStore::new(json!({"cache_dir": "/cache"}), json!({}), json!({}));
    /// {
    ///     let _guard = store.scoped([("cache_dir", json!("/tmp"))]);
    ///     assert_eq!(store.get("cache_dir"), Some(json!("/tmp")));
    /// }
    /// assert_eq!(store.get("cache_dir"), Some(json!("/cache")));
    /// ```
    pub fn scoped<K, I>(&self, overrides: I) -> OverrideGuard<'_>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut values = Value::Object(Map::new());
        for (key, value) in overrides {
            set_path(&mut values, key.as_ref(), value);
        }
        let id = self.next_frame.fetch_add(1, Ordering::Relaxed);

        let mut state = self.write();
        state.frames.push(Frame { id, values });
        state.rebuild();

        OverrideGuard { store: self, id }
    }

    /// Run `f` with `overrides` applied.
    pub fn with_overrides<K, I, R>(&self, overrides: I, f: impl FnOnce() -> R) -> R
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let _guard = self.scoped(overrides);
        f()
    }

    fn pop_frame(&self, id: u64) {
        let mut state = self.write();
        state.frames.retain(|frame| frame.id != id);
        state.rebuild();
    }

    /// Number of active scoped override frames.
    pub fn depth(&self) -> usize {
        self.read().frames.len()
    }

    /// The fully merged configuration tree.
    pub fn snapshot(&self) -> Value {
        self.read().merged.clone()
    }

    /// Extra configuration search directories, lowest priority first.
    ///
    /// Accepts a sequence or a colon-separated string.
    pub fn config_path(&self) -> Vec<PathBuf> {
        match self.get("config_path") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(PathBuf::from)
                .collect(),
            Some(Value::String(joined)) => super::env::split_search_path(&joined)
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.get_as::<PathBuf>("cache_dir").ok().flatten()
    }

    pub fn data_dir(&self) -> Option<PathBuf> {
        self.get_as::<PathBuf>("data_dir").ok().flatten()
    }
}

/// Removes its scoped override frame when dropped.
#[must_use = "the override ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct OverrideGuard<'a> {
    store: &'a ConfigStore,
    id: u64,
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        self.store.pop_frame(self.id);
    }
}

/// Environment layer as a configuration tree.
fn env_layer(vars: &EnvVars) -> Value {
    let mut layer = Value::Object(Map::new());
    for (key, value) in env_overrides(vars) {
        set_path(&mut layer, &key, value);
    }
    layer
}

static GLOBAL: OnceLock<ConfigStore> = OnceLock::new();

/// The process-wide configuration store.
///
/// Built on first access from a snapshot of the process environment, with
/// legacy names migrated in the snapshot. Files and environment are read
/// once.
pub fn global() -> &'static ConfigStore {
    GLOBAL.get_or_init(|| ConfigStore::from_env(&process_env()))
}
