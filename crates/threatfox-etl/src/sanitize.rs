//! Field name sanitization
//!
//! MongoDB rejects field names that contain `.` or start with `$`. Every
//! object key, at any depth, is rewritten by replacing each `.` and then
//! each `$` with `_`. Values other than objects and arrays pass through
//! untouched.
//!
//! Two keys that sanitize to the same name collapse into one entry: the key
//! visited later (in original key order) wins, and the entry keeps the
//! position of the first one.

use serde_json::{Map, Value};

const REPLACEMENT: &str = "_";

/// Rewrite a single field name
pub fn sanitize_key(key: &str) -> String {
    key.replace('.', REPLACEMENT).replace('$', REPLACEMENT)
}

/// Whether the store would accept `key` as a field name
pub fn is_store_safe_key(key: &str) -> bool {
    !key.contains('.') && !key.starts_with('$')
}

/// Recursively rewrite every object key inside `value`
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sanitize_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        scalar @ (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)) => scalar,
    }
}

/// Recursively rewrite the keys of one object
pub fn sanitize_map(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        out.insert(sanitize_key(&key), sanitize_value(value));
    }
    out
}

/// Check that no key at any depth would be rejected by the store
pub fn is_store_safe(value: &Value) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .all(|(key, value)| is_store_safe_key(key) && is_store_safe(value)),
        Value::Array(items) => items.iter().all(is_store_safe),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => true,
    }
}
