use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    auth::CryptError,
    certificate::CertificateError,
    error::log_error,
    grading::SubmissionError,
    model::{DatabaseError, ResourceType},
    payment::PaymentError,
    utils::validation::ValidationError,
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationUserConflict")]
    RegistrationUserConflict,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationTokenInvalid, source: {source_name}. Error: {error}")]
    AuthenticationTokenInvalid {
        source_name: &'static str,
        error: String,
    },

    #[error("AuthenticationRefreshInvalid")]
    AuthenticationRefreshInvalid,

    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },

    #[error("ResourceBadRequest: {resource_type:?}. Reason: {reason}")]
    ResourceBadRequest {
        resource_type: ResourceType,
        reason: String,
    },

    #[error("ResourceConflict: {resource_type:?}. Reason: {reason}")]
    ResourceConflict {
        resource_type: ResourceType,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] crate::auth::CryptError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RegistrationUserConflict => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationUserConflict => {
                String::from("Registration error, email or phone is already in use.")
            }
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationTokenInvalid { .. } => {
                String::from("Authentication error, token is invalid or expired.")
            }
            Self::AuthenticationRefreshInvalid => {
                String::from("Authentication error, refresh token is invalid or expired.")
            }
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationInvalidCredentials => {
                String::from("Authentication error, user not found or password is invalid.")
            }
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ResourceBadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::ResourceConflict { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
            Self::ResourceBadRequest { reason, .. } => format!("Resource error, {reason}."),
            Self::ResourceConflict { reason, .. } => format!("Resource conflict, {reason}."),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("ValidationError - {0}")]
    ValidationError(#[from] ValidationError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    pub fn resource_access(r#type: ResourceType, error: DatabaseError) -> Self {
        match error {
            DatabaseError::Forbidden => Self::resource_forbidden(r#type),
            other => Self::resource_fetch_error(r#type, other),
        }
    }

    pub fn resource_bad_request<S: Into<String>>(r#type: ResourceType, reason: S) -> Self {
        Self::ResourceError(ResourceError::ResourceBadRequest {
            resource_type: r#type,
            reason: reason.into(),
        })
    }

    pub fn resource_conflict<S: Into<String>>(r#type: ResourceType, reason: S) -> Self {
        Self::ResourceError(ResourceError::ResourceConflict {
            resource_type: r#type,
            reason: reason.into(),
        })
    }

    pub fn auth_token_invalid<E: std::fmt::Display>(source_name: &'static str, error: E) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationTokenInvalid {
            source_name,
            error: error.to_string(),
        })
    }

    pub fn auth_refresh_invalid() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRefreshInvalid)
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn registration_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationUserConflict)
    }

    pub fn server_crypt_error(e: CryptError) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::ServerError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::ValidationError(e) => format!("Validation error, {e}."),
            Self::ServerError(e) => e.client_display(),
        }
    }
}

impl From<SubmissionError> for WebError {
    fn from(e: SubmissionError) -> Self {
        let attempt = ResourceType::Attempt;
        match e {
            SubmissionError::EmptyAnswers
            | SubmissionError::TestMismatch
            | SubmissionError::TestRequired => Self::resource_bad_request(attempt, e.to_string()),
            SubmissionError::AttemptNotFound => Self::resource_not_found(attempt),
            SubmissionError::TestNotFound => Self::resource_not_found(ResourceType::Test),
            SubmissionError::Forbidden => Self::resource_forbidden(attempt),
            SubmissionError::AttemptsExhausted { .. } => {
                Self::resource_conflict(attempt, e.to_string())
            }
            SubmissionError::Database(e) => Self::resource_fetch_error(attempt, e),
        }
    }
}

impl From<CertificateError> for WebError {
    fn from(e: CertificateError) -> Self {
        let certificate = ResourceType::Certificate;
        match e {
            CertificateError::Duplicate => Self::resource_conflict(certificate, e.to_string()),
            CertificateError::NotEligible | CertificateError::Rejected(_) => {
                Self::resource_forbidden(certificate)
            }
            CertificateError::CourseNotFound => Self::resource_not_found(ResourceType::Course),
            CertificateError::LearnerNotFound => Self::resource_not_found(ResourceType::User),
            CertificateError::NotFound => Self::resource_not_found(certificate),
            CertificateError::InvalidHash => Self::resource_bad_request(certificate, e.to_string()),
            CertificateError::Crypt(e) => Self::server_crypt_error(e),
            CertificateError::Serialize(e) => {
                Self::resource_fetch_error(certificate, DatabaseError::SerdeError(e))
            }
            CertificateError::Database(e) => Self::resource_fetch_error(certificate, e),
        }
    }
}

impl From<PaymentError> for WebError {
    fn from(e: PaymentError) -> Self {
        let payment = ResourceType::Payment;
        match e {
            PaymentError::CourseNotFound => Self::resource_not_found(ResourceType::Course),
            PaymentError::NotFound => Self::resource_not_found(payment),
            PaymentError::InvalidAmount
            | PaymentError::InvalidSignature
            | PaymentError::MissingField(_) => Self::resource_bad_request(payment, e.to_string()),
            PaymentError::NotPending => Self::resource_conflict(payment, e.to_string()),
            PaymentError::Forbidden => Self::resource_forbidden(payment),
            PaymentError::Crypt(e) => Self::server_crypt_error(e),
            PaymentError::Database(e) => Self::resource_fetch_error(payment, e),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();
        let display = self.client_display();

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn submission_errors_map_to_http() {
        assert_eq!(
            WebError::from(SubmissionError::EmptyAnswers).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebError::from(SubmissionError::AttemptsExhausted { used: 3, max: 3 }).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            WebError::from(SubmissionError::Forbidden).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn certificate_and_payment_errors_map_to_http() {
        assert_eq!(
            WebError::from(CertificateError::Rejected("bad".into())).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            WebError::from(CertificateError::Duplicate).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            WebError::from(PaymentError::InvalidSignature).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebError::from(PaymentError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn invalid_tokens_are_unauthorized() {
        let e = WebError::auth_token_invalid("bearer", "expired");
        assert_eq!(e.status_code(), StatusCode::UNAUTHORIZED);
        assert!(e.client_display().contains("token"));
    }
}
