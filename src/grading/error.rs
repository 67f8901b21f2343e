use thiserror::Error;

use crate::model::DatabaseError;

pub type GradingResult<T> = std::result::Result<T, GradingError>;

#[derive(Debug, Error)]
pub enum GradingError {
    #[error("grading service timed out")]
    Timeout,
    #[error("grading service unreachable: {0}")]
    Connect(String),
    #[error("grading service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("grading transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("grading response is malformed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("AI grading is disabled")]
    Disabled,
}

impl GradingError {
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Transport(e)
        }
    }

    /// Connect failures, timeouts and 5xx are worth another try; 4xx never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Decode(_) | Self::Disabled => false,
        }
    }
}

pub type SubmissionResult<T> = std::result::Result<T, SubmissionError>;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("answers must not be empty")]
    EmptyAnswers,
    #[error("attempt not found")]
    AttemptNotFound,
    #[error("test not found")]
    TestNotFound,
    #[error("either a test or a test pool is required")]
    TestRequired,
    #[error("attempt belongs to another user")]
    Forbidden,
    #[error("test id does not match the attempt")]
    TestMismatch,
    #[error("attempts exhausted: {used} of {max}")]
    AttemptsExhausted { used: i32, max: i32 },
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for SubmissionError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(DatabaseError::SqlxError(e))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn retry_classification() {
        assert!(GradingError::Timeout.is_retryable());
        assert!(GradingError::Connect("refused".into()).is_retryable());
        assert!(
            GradingError::Status {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !GradingError::Status {
                status: 422,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!GradingError::Disabled.is_retryable());
    }
}
