use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Recursively sorts object keys so equal documents serialize identically.
fn sort_json_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), sort_json_value(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_json_value).collect()),
        _ => value.clone(),
    }
}

pub fn canonical_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(&sort_json_value(value))
}

/// `0x` + lower-case hex SHA-256 of the canonical form.
pub fn cert_hash(canonical: &str) -> String {
    let digest = Sha256::digest(canonical.as_bytes());
    format!("0x{}", hex::encode(digest))
}

pub fn is_cert_hash(candidate: &str) -> bool {
    candidate.len() == 66
        && candidate.starts_with("0x")
        && candidate[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn key_order_does_not_change_the_hash() {
        let a = json!({"b": 1, "a": {"d": [ {"y": 1, "x": 2} ], "c": null}});
        let b = json!({"a": {"c": null, "d": [ {"x": 2, "y": 1} ]}, "b": 1});

        let ca = canonical_json(&a).unwrap();
        assert_eq!(ca, r#"{"a":{"c":null,"d":[{"x":2,"y":1}]},"b":1}"#);
        assert_eq!(ca, canonical_json(&b).unwrap());
        assert_eq!(cert_hash(&ca), cert_hash(&canonical_json(&b).unwrap()));
    }

    #[test]
    fn hash_shape() {
        let hash = cert_hash("{}");
        assert_eq!(hash.len(), 66);
        assert!(is_cert_hash(&hash));
        // sha256("{}")
        assert_eq!(
            hash,
            "0x44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
        assert!(!is_cert_hash("44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"));
        assert!(!is_cert_hash("0xzz"));
    }
}
