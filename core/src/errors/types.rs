//! Token and validation error types
//!
//! Every `TokenError` is a security-token failure. Callers only ever see the
//! generic credential message; the variant is kept for internal logging.

use thiserror::Error;

/// Security-token errors for access and refresh credentials
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Unknown token")]
    UnknownToken,

    #[error("Token expired")]
    Expired,

    #[error("Token no longer active")]
    NoLongerActive,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Invalid claims")]
    InvalidClaims,
}

/// Input validation errors, raised before any store access
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field: {field}")]
    RequiredField { field: String },
}
