//! Domain-specific error types and error handling.

mod types;


pub use types::{TokenError, ValidationError};

use st_shared::errors::{error_codes, ConfigError, ErrorResponse, IntoErrorResponse, INVALID_CREDENTIAL_MESSAGE};
use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Lost an atomic state transition to a concurrent writer
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    ValidationErr(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DomainError {
    /// Whether this failure must be reported to the caller as an invalid credential.
    ///
    /// Unknown, expired, revoked and forged tokens, a vanished user and a lost
    /// rotation race are indistinguishable from the outside.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            DomainError::Token(_) | DomainError::NotFound { .. } | DomainError::Conflict { .. }
        )
    }

    /// Short label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation { .. } | DomainError::ValidationErr(_) => "validation",
            DomainError::NotFound { .. } => "not_found",
            DomainError::Conflict { .. } => "conflict",
            DomainError::Cancelled => "cancelled",
            DomainError::Internal { .. } => "internal",
            DomainError::Token(_) => "security_token",
            DomainError::Config(_) => "config",
        }
    }
}

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        if self.is_credential_failure() {
            return ErrorResponse::new(error_codes::TOKEN_INVALID, INVALID_CREDENTIAL_MESSAGE);
        }
        match self {
            DomainError::Validation { message } => {
                ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone())
            }
            DomainError::ValidationErr(e) => {
                ErrorResponse::new(error_codes::VALIDATION_ERROR, e.to_string())
            }
            DomainError::Cancelled => {
                ErrorResponse::new(error_codes::REQUEST_CANCELLED, "Request cancelled")
            }
            _ => ErrorResponse::new(error_codes::INTERNAL_ERROR, "Internal server error"),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
