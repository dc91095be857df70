//! Deterministic serialization (spec §4.I "Canonical serialization"): object
//! keys sorted lexicographically, no insignificant whitespace, numbers in
//! their default shortest round-trip form (no trailing zeros), sequences
//! preserving order. Hand-rolled over `serde_json::Value` rather than a
//! dedicated canonical-JSON crate, matching the pack's general preference
//! for small hand-rolled encoders over pulling in a single-purpose crate
//! (mirrors `canonical::pipeline`'s own hand-rolled whitespace-collapse
//! state machine).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::MbomError;

/// Serialize `value` to canonical JSON bytes.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, MbomError> {
    let value = serde_json::to_value(value)?;
    let sorted = sort_keys(value);
    Ok(serde_json::to_vec(&sorted)?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(key, v)| (key, sort_keys(v))).collect();
            let mut out = Map::new();
            for (key, v) in sorted {
                out.insert(key, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_lexicographically() {
        let value = json!({"b": 1, "a": 2, "c": {"z": 1, "y": 2}});
        let bytes = canonical_json_bytes(&value).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, r#"{"a":2,"b":1,"c":{"y":2,"z":1}}"#);
    }

    #[test]
    fn no_insignificant_whitespace() {
        let value = json!({"a": [1, 2, 3]});
        let bytes = canonical_json_bytes(&value).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains(' '));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn is_deterministic_across_calls() {
        let value = json!({"x": 1, "a": {"nested": true, "arr": [3, 1, 2]}});
        let first = canonical_json_bytes(&value).unwrap();
        let second = canonical_json_bytes(&value).unwrap();
        assert_eq!(first, second);
    }
}
