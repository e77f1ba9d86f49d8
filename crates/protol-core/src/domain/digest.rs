//! Payload fingerprints for action provenance.
//!
//! Inputs and outputs are never stored, only their SHA-256 digest and size.
//! Structured payloads are hashed over canonical JSON: object keys sorted,
//! no insignificant whitespace. Strings hash their UTF-8 bytes directly.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of raw bytes.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Canonical JSON text: sorted keys, compact separators.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    let key = Value::String(k.clone()).to_string();
                    format!("{key}:{}", canonical_json(&map[k.as_str()]))
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

/// SHA-256 hex digest of a payload.
///
/// `Null` hashes the literal `null`; strings hash their text.
pub fn hash_payload(value: &Value) -> String {
    match value {
        Value::String(text) => hash_bytes(text.as_bytes()),
        other => hash_bytes(canonical_json(other).as_bytes()),
    }
}

/// Serialised size of a payload in bytes; `0` for `Null`.
pub fn payload_size(value: &Value) -> u64 {
    match value {
        Value::Null => 0,
        Value::String(text) => text.len() as u64,
        other => other.to_string().len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_digest() {
        let a = json!({"b": 1, "a": {"y": [1, 2], "x": null}});
        let b = json!({"a": {"x": null, "y": [1, 2]}, "b": 1});
        assert_eq!(hash_payload(&a), hash_payload(&b));
        assert_eq!(canonical_json(&a), r#"{"a":{"x":null,"y":[1,2]},"b":1}"#);
    }

    #[test]
    fn known_digests() {
        assert_eq!(
            hash_payload(&Value::String("hello".to_string())),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            hash_payload(&Value::Null),
            "74234e98afe7498fb5daf1f36ac2d78acc339464f950703b8c019892f982b90b"
        );
    }

    #[test]
    fn sizes() {
        assert_eq!(payload_size(&Value::Null), 0);
        assert_eq!(payload_size(&json!("héllo")), 6);
        assert_eq!(payload_size(&json!({"a": 1})), 7);
    }
}
