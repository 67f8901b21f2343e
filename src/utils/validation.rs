use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+?[0-9]{1,4})?[0-9]{9,15}$").unwrap());
static WALLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap());
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

pub const CEFR_LEVELS: [&str; 6] = ["A1", "A2", "B1", "B2", "C1", "C2"];

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("field `{0}` is required")]
    Required(&'static str),
    #[error("invalid email format")]
    Email,
    #[error("invalid phone number format")]
    Phone,
    #[error("invalid wallet address format")]
    Wallet,
    #[error(
        "password must be at least 8 characters and contain upper-case, lower-case, digit and special characters"
    )]
    WeakPassword,
    #[error("invalid CEFR level `{0}`")]
    Level(String),
    #[error("invalid slug `{0}`")]
    Slug(String),
    #[error("`{field}` must be within {min}..={max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{0}")]
    Other(String),
}

pub fn require(field: &'static str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> ValidationResult<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::Email)
    }
}

pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::Phone)
    }
}

pub fn validate_wallet(wallet: &str) -> ValidationResult<()> {
    if WALLET_RE.is_match(wallet) {
        Ok(())
    } else {
        Err(ValidationError::Wallet)
    }
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    let long_enough = password.chars().count() >= 8;
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let special = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if long_enough && upper && lower && digit && special {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword)
    }
}

pub fn validate_level(level: &str) -> ValidationResult<()> {
    if CEFR_LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(ValidationError::Level(level.to_string()))
    }
}

pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::Slug(slug.to_string()))
    }
}

pub fn validate_range(field: &'static str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, min, max })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn email_rules() {
        assert!(validate_email("student@studyhub.vn").is_ok());
        assert_eq!(validate_email("student@localhost"), Err(ValidationError::Email));
        assert_eq!(validate_email("a b@c.d"), Err(ValidationError::Email));
    }

    #[test]
    fn phone_rules() {
        assert!(validate_phone("0912345678").is_ok());
        assert!(validate_phone("+84912345678").is_ok());
        assert_eq!(validate_phone("12345"), Err(ValidationError::Phone));
        assert_eq!(validate_phone("09123abc78"), Err(ValidationError::Phone));
    }

    #[test]
    fn wallet_rules() {
        assert!(validate_wallet("0x5FbDB2315678afecb367f032d93F642f64180aa3").is_ok());
        assert_eq!(validate_wallet("0x123"), Err(ValidationError::Wallet));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("Str0ng#pass").is_ok());
        for weak in ["short1!", "nouppercase1!", "NOLOWER1!", "NoDigits!!", "NoSpecial12"] {
            assert_eq!(validate_password(weak), Err(ValidationError::WeakPassword), "{weak}");
        }
    }

    #[test]
    fn levels_and_slugs() {
        assert!(validate_level("B2").is_ok());
        assert!(validate_level("b2").is_err());
        assert!(validate_slug("present-perfect").is_ok());
        assert!(validate_slug("Present Perfect").is_err());
    }

    #[test]
    fn ranges() {
        assert!(validate_range("rating", 5.0, 1.0, 5.0).is_ok());
        assert!(validate_range("rating", 0.0, 1.0, 5.0).is_err());
        assert!(validate_range("score", f64::NAN, 0.0, 10.0).is_err());
    }
}
