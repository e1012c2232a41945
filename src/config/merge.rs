//! Deep merge for layered YAML configuration.
//!
//! Higher tiers override lower tiers key by key. Arrays are replaced, not
//! concatenated.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// A null overlay means "not specified" and keeps the base value.
///
/// ```
/// use serde_json::json;
/// use task_assign::config::deep_merge;
///
/// let base = json!({ "server": { "port": 8000, "host": "127.0.0.1" } });
/// let overlay = json!({ "server": { "port": 9000 } });
/// assert_eq!(
///     deep_merge(base, overlay),
///     json!({ "server": { "port": 9000, "host": "127.0.0.1" } })
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold `deep_merge` over the tiers, later ones winning.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
