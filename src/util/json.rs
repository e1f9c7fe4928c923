use serde::Serialize;
use serde_json::Value;

/// Serializes `value` to JSON text whose object members always appear in sorted key order.
///
/// Two keys that differ only in the insertion order of their map members render
/// identically, which makes the output usable as a cache identity.
pub fn stable_stringify<T: ?Sized + Serialize>(value: &T) -> serde_json::Result<String> {
    let tree = serde_json::to_value(value)?;
    serde_json::to_string(&sort_members(tree))
}

fn sort_members(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_members(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_members).collect()),
        other => other,
    }
}
