//! Credential pair returned to callers after login or refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access token, raw refresh value and claim metadata
///
/// `Debug` redacts both secrets so the pair can be logged safely.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    /// Signed access token
    pub access_token: String,

    /// Opaque refresh value; only its hash is persisted
    pub refresh_token: String,

    /// End of the access token validity window
    pub access_token_expires_at: DateTime<Utc>,

    /// Claim metadata with typed values
    pub claims: serde_json::Map<String, serde_json::Value>,
}

impl CredentialPair {
    pub fn new(
        access_token: String,
        refresh_token: String,
        access_token_expires_at: DateTime<Utc>,
        claims: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            access_token_expires_at,
            claims,
        }
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("access_token_expires_at", &self.access_token_expires_at)
            .field("claims", &self.claims)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let pair = CredentialPair::new(
            "access".to_string(),
            "refresh".to_string(),
            Utc::now(),
            serde_json::Map::new(),
        );
        let json = serde_json::to_value(&pair).unwrap();

        assert_eq!(json["accessToken"], "access");
        assert_eq!(json["refreshToken"], "refresh");
        assert!(json.get("accessTokenExpiresAt").is_some());
        assert!(json.get("claims").is_some());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let pair = CredentialPair::new(
            "eyJhbGciOiJIUzI1NiJ9.secret".to_string(),
            "raw-refresh-value".to_string(),
            Utc::now(),
            serde_json::Map::new(),
        );
        let printed = format!("{:?}", pair);

        assert!(!printed.contains("raw-refresh-value"));
        assert!(!printed.contains("eyJhbGciOiJIUzI1NiJ9"));
    }
}
