//! Configuration loader with tier-based merging.
//!
//! Each tier location may be a single file or a directory of fragments.
//! Directory fragments (`.yaml`, `.yml`, `.json`) are merged in file name
//! order. Missing locations are skipped silently, broken files with a warning.

use super::env::EnvVars;
use super::merge::deep_merge_all;
use super::paths::{ConfigPaths, ConfigSource};
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions recognized inside configuration directories.
pub const FRAGMENT_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Parse one configuration file.
///
/// JSON is a subset of YAML, so a single parser covers all fragments. An
/// empty file yields an empty mapping.
pub fn read_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    let value: Value =
        serde_yaml::from_str(&content).map_err(|err| Error::config_parse(path, err))?;
    match value {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::Object(_) => Ok(value),
        other => Err(Error::config_parse(
            path,
            format!("expected a mapping at top level, found {}", type_name(&other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Files making up one source: the file itself, or a directory's fragments.
pub fn source_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let Ok(entries) = std::fs::read_dir(path) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| FRAGMENT_EXTENSIONS.contains(&ext))
        })
        .collect();
    files.sort();
    files
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    /// Files that were read successfully, in merge order
    loaded: Vec<PathBuf>,
    /// Merged file layer (defaults and environment excluded)
    merged: Value,
}

impl ConfigLoader {
    /// Load configuration from all tiers discovered from `vars`.
    pub fn load(vars: &EnvVars) -> Self {
        Self::load_with_paths(ConfigPaths::discover(vars))
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Self {
        let mut loaded = Vec::new();
        let mut layers = Vec::new();

        for ConfigSource { tier, path } in paths.sources() {
            for file in source_files(&path) {
                match read_config_file(&file) {
                    Ok(value) => {
                        debug!(tier = %tier, path = %file.display(), "Loaded config file");
                        layers.push(value);
                        loaded.push(file);
                    }
                    Err(err) => {
                        warn!(tier = %tier, "Skipping config file: {}", err);
                    }
                }
            }
        }

        let merged = match deep_merge_all(layers) {
            Value::Null => Value::Object(Default::default()),
            merged => merged,
        };

        Self {
            paths,
            loaded,
            merged,
        }
    }

    /// Merged values from all files.
    pub fn merged(&self) -> &Value {
        &self.merged
    }

    /// Consume the loader and return the merged values.
    pub fn into_merged(self) -> Value {
        self.merged
    }

    /// Files that contributed, lowest priority first.
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_nothing_found() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(Some(temp.path().join("pkg")), Vec::new());
        let loader = ConfigLoader::load_with_paths(paths);
        assert_eq!(loader.merged(), &json!({}));
        assert!(loader.loaded_files().is_empty());
    }

    #[test]
    fn test_env_dir_overrides_package() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("pkg");
        let user = temp.path().join("user");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::create_dir_all(&user).unwrap();
        std::fs::write(
            pkg.join("satpy.yaml"),
            "cache_dir: /pkg/cache\nreaders:\n  clip_negative: true\n",
        )
        .unwrap();
        std::fs::write(user.join("satpy.yaml"), "cache_dir: /user/cache\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(pkg), vec![user]);
        let loader = ConfigLoader::load_with_paths(paths);

        assert_eq!(
            loader.merged(),
            &json!({"cache_dir": "/user/cache", "readers": {"clip_negative": true}})
        );
        assert_eq!(loader.loaded_files().len(), 2);
    }

    #[test]
    fn test_last_listed_env_dir_wins() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(a.join("satpy.yaml"), "data_dir: /from/a\n").unwrap();
        std::fs::write(b.join("satpy.yaml"), "data_dir: /from/b\n").unwrap();

        let loader = ConfigLoader::load_with_paths(ConfigPaths::with_dirs(None, vec![a, b]));
        assert_eq!(loader.merged()["data_dir"], json!("/from/b"));
    }

    #[test]
    fn test_directory_of_fragments() {
        let temp = TempDir::new().unwrap();
        let env_dir = temp.path().join("env");
        let fragments = env_dir.join("satpy.yaml");
        std::fs::create_dir_all(&fragments).unwrap();
        std::fs::write(fragments.join("01-base.yaml"), "tmp_dir: /one\nlevel: 1\n").unwrap();
        std::fs::write(fragments.join("02-more.yml"), "level: 2\n").unwrap();
        std::fs::write(fragments.join("03-last.json"), r#"{"level": 3}"#).unwrap();
        std::fs::write(fragments.join("README.txt"), "level: 99\n").unwrap();

        let loader = ConfigLoader::load_with_paths(ConfigPaths::with_dirs(None, vec![env_dir]));
        assert_eq!(loader.merged(), &json!({"tmp_dir": "/one", "level": 3}));
        assert_eq!(loader.loaded_files().len(), 3);
    }

    #[test]
    fn test_broken_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(a.join("satpy.yaml"), "data_dir: /from/a\n").unwrap();
        std::fs::write(b.join("satpy.yaml"), "data_dir: [unclosed\n").unwrap();

        let loader = ConfigLoader::load_with_paths(ConfigPaths::with_dirs(None, vec![a, b]));
        assert_eq!(loader.merged()["data_dir"], json!("/from/a"));
        assert_eq!(loader.loaded_files().len(), 1);
    }

    #[test]
    fn test_read_config_file_rejects_scalar_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("scalar.yaml");
        std::fs::write(&file, "just a string\n").unwrap();
        let err = read_config_file(&file).unwrap_err();
        assert!(err.to_string().contains("expected a mapping"));
    }

    #[test]
    fn test_read_empty_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("empty.yaml");
        std::fs::write(&file, "").unwrap();
        assert_eq!(read_config_file(&file).unwrap(), json!({}));
    }
}
