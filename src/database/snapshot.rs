use std::cmp::Ordering;

use serde_json::{Map, Value};

const VALUE_KEY: &str = ".value";
const PRIORITY_KEY: &str = ".priority";

/// Flattens a realtime-database node into a plain JSON value.
///
/// Priority metadata is stripped at every level. With `to_array`, every node that has
/// children is turned into an array of its flattened children in database key order;
/// leaves are returned as they are. Missing data, and nodes holding nothing but metadata,
/// read as `null`.
pub fn parse_snapshot(value: &Value, to_array: bool) -> Value {
    let data = extract_data_ref(value);
    if !to_array {
        return plain_value(data);
    }

    match data {
        Value::Object(map) if has_children(map) => {
            let children: Vec<Value> = ordered_children(map)
                .into_iter()
                .map(|(_, child)| parse_snapshot(child, true))
                .filter(|child| !child.is_null())
                .collect();
            if children.is_empty() {
                Value::Null
            } else {
                Value::Array(children)
            }
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| parse_snapshot(item, true))
                .collect(),
        ),
        other => plain_value(other),
    }
}

/// Children of a node in database key order, skipping metadata and empty children.
///
/// Keys that parse as 32-bit integers sort first, numerically; the rest follow in
/// lexicographic order.
pub fn ordered_children(map: &Map<String, Value>) -> Vec<(&str, &Value)> {
    let mut children: Vec<(&str, &Value)> = map
        .iter()
        .filter(|(key, child)| !is_metadata_key(key) && !child.is_null())
        .map(|(key, child)| (key.as_str(), child))
        .collect();
    children.sort_by(|(left, _), (right, _)| compare_keys(left, right));
    children
}

/// Database key ordering used by [`ordered_children`].
pub fn compare_keys(left: &str, right: &str) -> Ordering {
    match (integer_key(left), integer_key(right)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.cmp(right),
    }
}

fn integer_key(key: &str) -> Option<i32> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) || key == "-0" {
        return None;
    }
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    key.parse::<i32>().ok()
}

fn has_children(map: &Map<String, Value>) -> bool {
    map.iter()
        .any(|(key, child)| !is_metadata_key(key) && !child.is_null())
}

fn is_metadata_key(key: &str) -> bool {
    key == PRIORITY_KEY || key == VALUE_KEY
}

fn extract_data_ref(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|obj| obj.get(VALUE_KEY))
        .unwrap_or(value)
}

/// Nodes without data (no children left once metadata is stripped) read as `null`.
fn plain_value(value: &Value) -> Value {
    match extract_data_ref(value) {
        Value::Object(map) => {
            let children: Map<String, Value> = map
                .iter()
                .filter(|(key, _)| !is_metadata_key(key))
                .map(|(key, child)| (key.clone(), plain_value(child)))
                .filter(|(_, child)| !child.is_null())
                .collect();
            if children.is_empty() {
                Value::Null
            } else {
                Value::Object(children)
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(plain_value).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_data_stays_null() {
        assert_eq!(parse_snapshot(&Value::Null, false), Value::Null);
        assert_eq!(parse_snapshot(&Value::Null, true), Value::Null);
    }

    #[test]
    fn strips_priority_metadata() {
        let node = json!({
            ".priority": 5,
            "name": { ".value": "Ada", ".priority": 1 },
            "age": 36
        });
        assert_eq!(
            parse_snapshot(&node, false),
            json!({ "name": "Ada", "age": 36 })
        );
        assert_eq!(
            parse_snapshot(&json!({ ".value": 3, ".priority": "a" }), false),
            json!(3)
        );
    }

    #[test]
    fn to_array_orders_children_by_key() {
        let node = json!({
            "b": { "title": "second" },
            "10": { "title": "ten" },
            "2": { "title": "two" },
            "a": { "title": "first" }
        });
        assert_eq!(
            parse_snapshot(&node, true),
            json!([["two"], ["ten"], ["first"], ["second"]])
        );
    }

    #[test]
    fn to_array_keeps_leaves_and_skips_empty_children() {
        let node = json!({ "x": 1, "y": null, "z": "three" });
        assert_eq!(parse_snapshot(&node, true), json!([1, "three"]));
        assert_eq!(parse_snapshot(&json!("leaf"), true), json!("leaf"));
        assert_eq!(parse_snapshot(&json!({}), true), Value::Null);
    }

    #[test]
    fn nodes_without_data_read_as_null() {
        assert_eq!(parse_snapshot(&json!({}), false), Value::Null);
        assert_eq!(parse_snapshot(&json!({ ".priority": 5 }), false), Value::Null);
        assert_eq!(parse_snapshot(&json!({ ".priority": 5 }), true), Value::Null);
        assert_eq!(
            parse_snapshot(&json!({ "1": "one", "2": { ".priority": 2 } }), true),
            json!(["one"])
        );
        assert_eq!(
            parse_snapshot(&json!({ "kept": 1, "gone": { ".priority": 2 } }), false),
            json!({ "kept": 1 })
        );
    }

    #[test]
    fn integer_keys_sort_numerically_before_strings() {
        let mut keys = vec!["b", "10", "-3", "2", "a", "007", "2147483648"];
        keys.sort_by(|left, right| compare_keys(left, right));
        assert_eq!(keys, vec!["-3", "2", "10", "007", "2147483648", "a", "b"]);
    }
}
