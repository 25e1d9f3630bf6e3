//! Integration tests for the layered configuration store.
//!
//! Tests scoped overrides and file layering through the public API.

use satpy_core::Error;
use satpy_core::config::{ConfigPaths, ConfigStore, default_values};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tempfile::TempDir;

fn empty_store() -> ConfigStore {
    ConfigStore::new(json!({"cache_dir": "/cache"}), json!({}), json!({}))
}

#[test]
fn test_scoped_override_restores_value() {
    let store = empty_store();
    {
        let _guard = store.scoped([("cache_dir", json!("/scratch"))]);
        assert_eq!(store.get("cache_dir"), Some(json!("/scratch")));
    }
    assert_eq!(store.get("cache_dir"), Some(json!("/cache")));
}

#[test]
fn test_scoped_override_restores_absence_after_panic() {
    let store = empty_store();
    let result = catch_unwind(AssertUnwindSafe(|| {
        store.with_overrides([("readers.clip_negative", json!(false))], || {
            assert_eq!(store.get("readers.clip_negative"), Some(json!(false)));
            panic!("compositor failed");
        })
    }));
    assert!(result.is_err());
    assert_eq!(store.get("readers.clip_negative"), None);
    assert!(matches!(
        store.require("readers.clip_negative"),
        Err(Error::MissingKey(_))
    ));
    assert_eq!(store.depth(), 0);
}

#[test]
fn test_nested_overrides() {
    let store = empty_store();
    let outer = store.scoped([("tmp_dir", json!("/outer"))]);
    let inner = store.scoped([("tmp_dir", json!("/inner")), ("extra", json!(1))]);
    assert_eq!(store.get("tmp_dir"), Some(json!("/inner")));

    drop(outer);
    assert_eq!(store.get("tmp_dir"), Some(json!("/inner")));

    drop(inner);
    assert_eq!(store.get("tmp_dir"), None);
    assert_eq!(store.get("extra"), None);
}

#[test]
fn test_files_layered_under_environment() {
    let temp = TempDir::new().unwrap();
    let pkg = temp.path().join("pkg");
    let site = temp.path().join("site");
    std::fs::create_dir_all(&pkg).unwrap();
    std::fs::create_dir_all(site.join("satpy.yaml")).unwrap();
    std::fs::write(
        pkg.join("satpy.yaml"),
        "cache_dir: /pkg/cache\nreaders:\n  clip_negative: true\n  calibrate: true\n",
    )
    .unwrap();
    std::fs::write(
        site.join("satpy.yaml").join("10-readers.yaml"),
        "readers:\n  clip-negative: false\n",
    )
    .unwrap();

    let vars: BTreeMap<String, String> =
        [("SATPY_CACHE_DIR".to_string(), "/env/cache".to_string())].into();
    let store = ConfigStore::with_paths(ConfigPaths::with_dirs(Some(pkg), vec![site]), &vars);

    assert_eq!(store.get("cache_dir"), Some(json!("/env/cache")));
    assert_eq!(store.get("readers.clip_negative"), Some(json!(false)));
    assert_eq!(store.get("readers.calibrate"), Some(json!(true)));
    assert_eq!(store.get_as::<bool>("readers.calibrate").unwrap(), Some(true));
    assert!(store.get_as::<u32>("cache_dir").is_err());
}

#[test]
fn test_defaults_shape() {
    let defaults = default_values();
    assert_eq!(defaults["config_path"], Value::Array(Vec::new()));
    assert!(defaults.get("cache_dir").is_some());
    assert!(defaults.get("data_dir").is_some());
}
