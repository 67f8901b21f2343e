use serde_json::{Map, Value};

use crate::auth::{CryptResult, hmac_sha256_hex, verify_hmac_sha256_hex};

fn field_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `k1=v1&k2=v2...` over the keys in alphabetical order; `null` becomes empty.
pub fn signing_string(data: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = data.keys().collect();
    keys.sort();
    keys.iter()
        .map(|k| format!("{k}={}", field_value(&data[k.as_str()])))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn sign_payload(checksum_key: &str, data: &Map<String, Value>) -> CryptResult<String> {
    hmac_sha256_hex(checksum_key, &signing_string(data))
}

pub fn verify_payload(
    checksum_key: &str,
    data: &Map<String, Value>,
    signature: &str,
) -> CryptResult<bool> {
    verify_hmac_sha256_hex(checksum_key, &signing_string(data), signature)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn data() -> Map<String, Value> {
        json!({
            "order_code": 123456,
            "amount": 250000,
            "description": "IELTS",
            "code": "00",
            "reference": null,
            "paid": true
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn keys_are_sorted_and_nulls_empty() {
        assert_eq!(
            signing_string(&data()),
            "amount=250000&code=00&description=IELTS&order_code=123456&paid=true&reference="
        );
    }

    #[test]
    fn tampered_payload_fails() {
        let sig = sign_payload("checksum", &data()).unwrap();
        assert!(verify_payload("checksum", &data(), &sig).unwrap());

        let mut tampered = data();
        tampered.insert("amount".into(), json!(1));
        assert!(!verify_payload("checksum", &tampered, &sig).unwrap());
        assert!(!verify_payload("other", &data(), &sig).unwrap());
    }
}
