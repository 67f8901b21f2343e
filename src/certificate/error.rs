use thiserror::Error;

use crate::{auth::CryptError, model::DatabaseError};

pub type CertificateResult<T> = std::result::Result<T, CertificateError>;

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("certificate already issued for this learner and course")]
    Duplicate,
    #[error("learner has not passed the final test of the course")]
    NotEligible,
    #[error("course not found")]
    CourseNotFound,
    #[error("learner not found")]
    LearnerNotFound,
    #[error("certificate not found")]
    NotFound,
    #[error("certificate hash must be 0x followed by 64 hex characters")]
    InvalidHash,
    #[error("certificate rejected: {0}")]
    Rejected(String),
    #[error("crypt error: {0}")]
    Crypt(#[from] CryptError),
    #[error("metadata serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for CertificateError {
    fn from(e: DatabaseError) -> Self {
        if e.is_unique_violation() {
            Self::Duplicate
        } else {
            Self::Database(e)
        }
    }
}
