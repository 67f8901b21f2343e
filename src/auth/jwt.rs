use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
}

impl UserClaims {
    pub fn new(user_id: uuid::Uuid, role: impl Into<String>, lifetime: chrono::Duration) -> Self {
        Self {
            sub: user_id.to_string(),
            role: role.into(),
            exp: (chrono::Utc::now() + lifetime).timestamp(),
        }
    }
}

pub fn generate_token<K: AsRef<[u8]>>(
    claims: UserClaims,
    key: K,
) -> jsonwebtoken::errors::Result<String> {
    let header = Header::default();
    let key = EncodingKey::from_secret(key.as_ref());

    let token = jsonwebtoken::encode(&header, &claims, &key)?;
    Ok(token)
}

pub fn process_token<K: AsRef<[u8]>>(
    token: &str,
    key: K,
) -> jsonwebtoken::errors::Result<TokenData<UserClaims>> {
    let validation = Validation::default();
    let key = DecodingKey::from_secret(key.as_ref());

    let claims = jsonwebtoken::decode::<UserClaims>(token, &key, &validation)?;
    Ok(claims)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_roundtrip_keeps_role() {
        let id = uuid::Uuid::new_v4();
        let claims = UserClaims::new(id, "teacher", chrono::Duration::minutes(5));
        let token = generate_token(claims, "key").unwrap();

        let data = process_token(&token, "key").unwrap();
        assert_eq!(data.claims.sub, id.to_string());
        assert_eq!(data.claims.role, "teacher");
    }

    #[test]
    fn expired_or_foreign_tokens_are_rejected() {
        let id = uuid::Uuid::new_v4();
        let expired = UserClaims::new(id, "student", chrono::Duration::hours(-2));
        let token = generate_token(expired, "key").unwrap();
        assert!(process_token(&token, "key").is_err());

        let fresh = UserClaims::new(id, "student", chrono::Duration::minutes(5));
        let token = generate_token(fresh, "key").unwrap();
        assert!(process_token(&token, "other-key").is_err());
    }
}
