//! Deep merge and dotted-key access for configuration trees.
//!
//! Configuration files are parsed into `serde_json::Value` trees and merged
//! in priority order. Keys are addressed with dotted paths (`a.b.c`), where
//! hyphens and underscores in a segment are interchangeable.

use serde_json::{Map, Value};

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans are replaced entirely
/// - If overlay is null, the base value is preserved (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use satpy_core::config::deep_merge;
///
/// let base = json!({"cache_dir": "/tmp/cache", "readers": {"clip_negative": true}});
/// let overlay = json!({"readers": {"clip_negative": false}});
/// let result = deep_merge(base, overlay);
/// assert_eq!(result, json!({"cache_dir": "/tmp/cache", "readers": {"clip_negative": false}}));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    merge_with(base, overlay, false)
}

/// Deep merge where a null in `overlay` replaces the base value.
///
/// Used for explicitly set values, where null means "unset" and must shadow
/// anything below it.
///
/// ```
/// use serde_json::json;
/// use satpy_core::config::deep_override;
///
/// let base = json!({"cache_dir": "/tmp/cache", "data_dir": "/data"});
/// let overlay = json!({"cache_dir": null});
/// assert_eq!(
///     deep_override(base, overlay),
///     json!({"cache_dir": null, "data_dir": "/data"})
/// );
/// ```
pub fn deep_override(base: Value, overlay: Value) -> Value {
    merge_with(base, overlay, true)
}

fn merge_with(base: Value, overlay: Value, null_replaces: bool) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                // Spelling of the lower layer wins so `cache-dir` and
                // `cache_dir` land on the same entry.
                let key = find_key(&base_map, &key).cloned().unwrap_or(key);
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => merge_with(base_value, overlay_value, null_replaces),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) if !null_replaces => base,
        (_, overlay) => overlay,
    }
}

/// Merge multiple values in order, with later values taking precedence.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

/// Locate `segment` in `map`, treating `-` and `_` as equivalent.
fn find_key<'a>(map: &'a Map<String, Value>, segment: &str) -> Option<&'a String> {
    if let Some((key, _)) = map.get_key_value(segment) {
        return Some(key);
    }
    let canonical = canonical_segment(segment);
    map.keys().find(|k| canonical_segment(k) == canonical)
}

fn canonical_segment(segment: &str) -> String {
    segment.replace('-', "_")
}

/// Look up a dotted key in a configuration tree.
pub fn get_path<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in key.split('.') {
        let map = current.as_object()?;
        let found = find_key(map, segment)?;
        current = map.get(found)?;
    }
    Some(current)
}

/// Set a dotted key, creating intermediate mappings as needed.
///
/// Any non-mapping value found on the way is replaced by a mapping.
pub fn set_path(root: &mut Value, key: &str, value: Value) {
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    let Value::Object(map) = root else {
        return;
    };
    let (segment, rest) = match key.split_once('.') {
        Some((segment, rest)) => (segment, Some(rest)),
        None => (key, None),
    };
    let name = find_key(map, segment)
        .cloned()
        .unwrap_or_else(|| segment.to_string());
    match rest {
        Some(rest) => set_path(map.entry(name).or_insert(Value::Null), rest, value),
        None => {
            map.insert(name, value);
        }
    }
}

/// Remove a dotted key, returning the previous value if any.
pub fn remove_path(root: &mut Value, key: &str) -> Option<Value> {
    let (parent, last) = match key.rsplit_once('.') {
        Some((parent, last)) => (Some(parent), last),
        None => (None, key),
    };
    let container = match parent {
        Some(parent) => get_path_mut(root, parent)?,
        None => root,
    };
    let map = container.as_object_mut()?;
    let found = find_key(map, last).cloned()?;
    map.remove(&found)
}

fn get_path_mut<'a>(root: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in key.split('.') {
        let map = current.as_object_mut()?;
        let found = find_key(map, segment).cloned()?;
        current = map.get_mut(&found)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_simple_objects() {
        let base = json!({"cache_dir": "/a", "data_dir": "/b"});
        let overlay = json!({"data_dir": "/c", "tmp_dir": "/d"});
        let result = deep_merge(base, overlay);
        assert_eq!(
            result,
            json!({"cache_dir": "/a", "data_dir": "/c", "tmp_dir": "/d"})
        );
    }

    #[test]
    fn test_merge_nested_objects() {
        let base = json!({
            "readers": {"clip_negative": true, "chunks": 4096},
            "cache_dir": "/a"
        });
        let overlay = json!({"readers": {"chunks": 1024}});
        let result = deep_merge(base, overlay);
        assert_eq!(
            result,
            json!({
                "readers": {"clip_negative": true, "chunks": 1024},
                "cache_dir": "/a"
            })
        );
    }

    #[test]
    fn test_config_path_list_replaced() {
        let base = json!({"config_path": ["/a", "/b"]});
        let overlay = json!({"config_path": ["/c"]});
        assert_eq!(deep_merge(base, overlay), json!({"config_path": ["/c"]}));
    }

    #[test]
    fn test_null_preserves_base() {
        let base = json!({"cache_dir": "/a"});
        let overlay = json!({"cache_dir": null});
        assert_eq!(deep_merge(base, overlay), json!({"cache_dir": "/a"}));
    }

    #[test]
    fn test_override_null_replaces_base() {
        let base = json!({"cache_dir": "/a", "readers": {"chunks": 64, "clip_negative": true}});
        let overlay = json!({"cache_dir": null, "readers": {"chunks": null}});
        assert_eq!(
            deep_override(base, overlay),
            json!({"cache_dir": null, "readers": {"chunks": null, "clip_negative": true}})
        );
    }

    #[test]
    fn test_merge_hyphen_and_underscore_share_entry() {
        let base = json!({"cache_dir": "/a"});
        let overlay = json!({"cache-dir": "/b"});
        assert_eq!(deep_merge(base, overlay), json!({"cache_dir": "/b"}));
    }

    #[test]
    fn test_merge_all() {
        let values = vec![json!({"a": 1}), json!({"b": 2}), json!({"a": 3, "c": 4})];
        assert_eq!(deep_merge_all(values), json!({"a": 3, "b": 2, "c": 4}));
    }

    #[test]
    fn test_get_path() {
        let tree = json!({"readers": {"clip_negative": true}, "data_dir": "/d"});
        assert_eq!(get_path(&tree, "data_dir"), Some(&json!("/d")));
        assert_eq!(get_path(&tree, "readers.clip-negative"), Some(&json!(true)));
        assert_eq!(get_path(&tree, "readers.missing"), None);
        assert_eq!(get_path(&tree, "data_dir.child"), None);
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let mut tree = json!({"data_dir": "/d"});
        set_path(&mut tree, "readers.chunks.x", json!(10));
        assert_eq!(
            tree,
            json!({"data_dir": "/d", "readers": {"chunks": {"x": 10}}})
        );

        set_path(&mut tree, "data_dir.nested", json!(1));
        assert_eq!(get_path(&tree, "data_dir.nested"), Some(&json!(1)));
    }

    #[test]
    fn test_remove_path() {
        let mut tree = json!({"readers": {"a": 1, "b": 2}});
        assert_eq!(remove_path(&mut tree, "readers.a"), Some(json!(1)));
        assert_eq!(remove_path(&mut tree, "readers.a"), None);
        assert_eq!(tree, json!({"readers": {"b": 2}}));
    }
}
