use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::{CryptError, CryptResult};

type HmacSha256 = Hmac<Sha256>;

pub fn hmac_sha256_hex(key: &str, message: &str) -> CryptResult<String> {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| CryptError::HmacKeyError)?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison against a hex signature. Malformed hex never verifies.
pub fn verify_hmac_sha256_hex(key: &str, message: &str, signature: &str) -> CryptResult<bool> {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return Ok(false);
    };

    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| CryptError::HmacKeyError)?;
    mac.update(message.as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2
        let sig = hmac_sha256_hex("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verify_accepts_own_signature_only() {
        let sig = hmac_sha256_hex("k", "payload").unwrap();
        assert!(verify_hmac_sha256_hex("k", "payload", &sig).unwrap());
        assert!(verify_hmac_sha256_hex("k", "payload", &sig.to_uppercase()).unwrap());
        assert!(!verify_hmac_sha256_hex("k", "payload2", &sig).unwrap());
        assert!(!verify_hmac_sha256_hex("k", "payload", "zz").unwrap());
    }
}
