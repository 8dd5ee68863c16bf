//! Access token claim types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::errors::TokenError;

/// Claim names owned by the issuer. Extra attributes may not use them.
pub const RESERVED_CLAIMS: &[&str] = &["sub", "email", "role", "jti", "iat", "nbf", "exp", "iss", "aud"];

/// Value of a caller-supplied extra attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl ClaimValue {
    /// Textual form used inside the signed token
    pub fn to_claim_string(&self) -> String {
        match self {
            ClaimValue::Bool(b) => b.to_string(),
            ClaimValue::Integer(i) => i.to_string(),
            ClaimValue::Float(f) => f.to_string(),
            ClaimValue::String(s) => s.clone(),
        }
    }

    /// Typed form returned to the caller as metadata
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ClaimValue::Bool(b) => serde_json::Value::Bool(*b),
            ClaimValue::Integer(i) => serde_json::Value::from(*i),
            ClaimValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            ClaimValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        ClaimValue::Bool(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        ClaimValue::Integer(value)
    }
}

impl From<f64> for ClaimValue {
    fn from(value: f64) -> Self {
        ClaimValue::Float(value)
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::String(value)
    }
}

/// Claims structure for the signed access token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Email of the principal
    pub email: String,

    /// Role claims
    #[serde(default)]
    pub role: Vec<String>,

    /// JWT ID (unique identifier for the token)
    pub jti: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Caller-supplied attributes, rendered as text
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl AccessTokenClaims {
    /// Gets the user ID from the claims
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::InvalidClaims)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.iter().any(|r| r == role)
    }
}
