mod password;
pub use password::{hash_password, verify_password};
mod jwt;
pub use jwt::{UserClaims, generate_token, process_token};
mod token;
pub use token::generate_opaque_token;
mod signature;
pub use signature::{hmac_sha256_hex, verify_hmac_sha256_hex};
mod error;
pub use error::{CryptError, CryptResult};
