//! Canonical JSON serialization for cart and order `custom_data`.
//!
//! Two payloads that differ only in object key order or whitespace produce
//! the same canonical string, which is what cart line merging compares.

use serde_json::{Map, Value};

/// The canonical form of a missing or invalid payload.
pub const EMPTY_OBJECT: &str = "{}";

/// Recursively rebuild `value` with every object's keys sorted.
pub fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical_value(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        other => other.clone(),
    }
}

/// Canonical string of an already-parsed payload.
///
/// Anything other than a JSON object normalizes to `{}`.
pub fn canonicalize_value(value: Option<&Value>) -> String {
    match value {
        Some(v @ Value::Object(_)) => {
            serde_json::to_string(&canonical_value(v)).unwrap_or_else(|_| EMPTY_OBJECT.into())
        }
        _ => EMPTY_OBJECT.to_string(),
    }
}

/// Canonical string of a raw JSON text; invalid or non-object input becomes `{}`.
pub fn canonicalize_json(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => canonicalize_value(Some(&value)),
        Err(_) => EMPTY_OBJECT.to_string(),
    }
}

/// Parse a stored canonical string back into a value, defaulting to `{}`.
pub fn parse_stored(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::Object(Map::new()))
}
