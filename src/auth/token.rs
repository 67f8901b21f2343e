use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use rand::{self, RngCore};

pub fn generate_opaque_token() -> String {
    let mut buf = [0u8; 32];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE.encode(buf)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_opaque_token();
        let b = generate_opaque_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 44);
        assert!(!a.contains('+') && !a.contains('/'));
    }
}
