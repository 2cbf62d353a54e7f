//! Small helpers over `serde_json::Value` trees: deep merge and path access.

use serde_json::{Map, Value};

/// Merge `patch` into `base`. Objects are merged key by key, recursively; any other value in
/// `patch` replaces what was in `base`.
pub fn deep_merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, patch_value),
                    None => {
                        base_map.insert(key, patch_value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

/// Walk `path` through nested objects.
pub fn fetch_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Store `new_value` at `path`, creating intermediate objects. A non-object found on the way is
/// replaced by an object.
pub fn store_path(value: &mut Value, path: &[&str], new_value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *value = new_value;
        return;
    };

    let mut current = value;
    for key in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        current = map.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        map.insert(last.to_string(), new_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge_keeps_untouched_keys() {
        let mut settings = json!({"display": {"theme": "light", "locale": "en"}, "quadicons": {"host": true}});
        deep_merge(&mut settings, json!({"display": {"theme": "dark"}}));

        assert_eq!(
            settings,
            json!({"display": {"theme": "dark", "locale": "en"}, "quadicons": {"host": true}})
        );
    }

    #[test]
    fn test_deep_merge_replaces_non_objects() {
        let mut base = json!({"a": [1, 2], "b": {"c": 1}});
        deep_merge(&mut base, json!({"a": [3], "b": 5}));
        assert_eq!(base, json!({"a": [3], "b": 5}));
    }

    #[test]
    fn test_deep_merge_into_empty() {
        let mut base = json!({});
        deep_merge(&mut base, json!({"theme": "dark"}));
        assert_eq!(base, json!({"theme": "dark"}));
    }

    #[test]
    fn test_fetch_and_store_path() {
        let mut value = json!({"objects": {"root": {"a": "1"}}});
        assert_eq!(fetch_path(&value, &["objects", "root", "a"]), Some(&json!("1")));
        assert_eq!(fetch_path(&value, &["objects", "nada", "a"]), None);

        store_path(&mut value, &["objects", "root", "b"], json!(2));
        store_path(&mut value, &["objects", "other", "c"], json!(3));
        assert_eq!(value, json!({"objects": {"root": {"a": "1", "b": 2}, "other": {"c": 3}}}));
    }

    #[test]
    fn test_store_path_replaces_scalars_on_the_way() {
        let mut value = json!({"objects": "oops"});
        store_path(&mut value, &["objects", "root", "x"], json!(true));
        assert_eq!(value, json!({"objects": {"root": {"x": true}}}));
    }
}
