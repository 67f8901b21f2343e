use thiserror::Error;

use crate::{auth::CryptError, model::DatabaseError};

pub type PaymentResult<T> = std::result::Result<T, PaymentError>;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("course not found")]
    CourseNotFound,
    #[error("payment not found")]
    NotFound,
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("webhook signature is invalid")]
    InvalidSignature,
    #[error("webhook payload is missing `{0}`")]
    MissingField(&'static str),
    #[error("only pending payments can be cancelled")]
    NotPending,
    #[error("payment belongs to another user")]
    Forbidden,
    #[error("crypt error: {0}")]
    Crypt(#[from] CryptError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}
