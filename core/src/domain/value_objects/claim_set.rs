//! Immutable claim set produced by the claims builder.

use std::collections::BTreeMap;
use uuid::Uuid;

/// Identity, roles and extra attributes to embed in an access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    user_id: Uuid,
    email: String,
    roles: Vec<String>,
    extra: BTreeMap<String, String>,
}

impl ClaimSet {
    pub(crate) fn new(
        user_id: Uuid,
        email: String,
        roles: Vec<String>,
        extra: BTreeMap<String, String>,
    ) -> Self {
        Self {
            user_id,
            email,
            roles,
            extra,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Deduplicated roles in first-seen order
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Extra attributes in their signed (textual) form
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }
}

/// Claim set plus the typed companion map returned to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltClaims {
    pub claims: ClaimSet,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
