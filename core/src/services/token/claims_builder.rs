//! Builds the claim set embedded in access tokens

use std::collections::{BTreeMap, HashMap};
use tracing::warn;
use uuid::Uuid;

use crate::domain::entities::{ClaimValue, RESERVED_CLAIMS};
use crate::domain::value_objects::{BuiltClaims, ClaimSet};

/// Caller-supplied attributes. `None` values are skipped.
pub type ExtraClaims = HashMap<String, Option<ClaimValue>>;

/// Pure builder for access token claims
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsBuilder;

impl ClaimsBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the claim set and its typed companion map.
    ///
    /// Roles are deduplicated keeping the first occurrence. Extras whose key
    /// is empty or collides with a reserved claim are dropped.
    pub fn build<R: AsRef<str>>(
        &self,
        user_id: Uuid,
        email: &str,
        roles: &[R],
        extra: Option<&ExtraClaims>,
    ) -> BuiltClaims {
        let mut unique_roles: Vec<String> = Vec::with_capacity(roles.len());
        for role in roles {
            let role = role.as_ref();
            if !role.is_empty() && !unique_roles.iter().any(|r| r == role) {
                unique_roles.push(role.to_string());
            }
        }

        let mut signed = BTreeMap::new();
        let mut typed = BTreeMap::new();
        if let Some(extra) = extra {
            for (key, value) in extra {
                let Some(value) = value else { continue };
                if key.is_empty() || RESERVED_CLAIMS.contains(&key.as_str()) {
                    warn!(claim = %key, user_id = %user_id, "Dropping extra claim with reserved name");
                    continue;
                }
                signed.insert(key.clone(), value.to_claim_string());
                typed.insert(key.clone(), value.to_json());
            }
        }

        let mut metadata = serde_json::Map::new();
        metadata.insert("sub".to_string(), serde_json::Value::String(user_id.to_string()));
        metadata.insert("email".to_string(), serde_json::Value::String(email.to_string()));
        metadata.insert(
            "role".to_string(),
            serde_json::Value::Array(
                unique_roles
                    .iter()
                    .map(|r| serde_json::Value::String(r.clone()))
                    .collect(),
            ),
        );
        metadata.extend(typed);

        BuiltClaims {
            claims: ClaimSet::new(user_id, email.to_string(), unique_roles, signed),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roles_deduplicated_in_order() {
        let built = ClaimsBuilder::new().build(
            Uuid::new_v4(),
            "ops@shiptrack.test",
            &["Staff", "Admin", "Staff", "", "Admin"],
            None,
        );

        assert_eq!(built.claims.roles(), &["Staff".to_string(), "Admin".to_string()]);
        assert_eq!(built.metadata["role"], json!(["Staff", "Admin"]));
    }

    #[test]
    fn test_no_roles() {
        let roles: [&str; 0] = [];
        let built = ClaimsBuilder::new().build(Uuid::new_v4(), "a@b.test", &roles, None);
        assert!(built.claims.roles().is_empty());
        assert_eq!(built.metadata["role"], json!([]));
    }

    #[test]
    fn test_extras_rendered_as_text_but_typed_in_metadata() {
        let mut extra = ExtraClaims::new();
        extra.insert("is_dispatcher".to_string(), Some(ClaimValue::from(true)));
        extra.insert("depot_id".to_string(), Some(ClaimValue::from(17i64)));
        extra.insert("region".to_string(), Some(ClaimValue::from("north")));
        extra.insert("nickname".to_string(), None);

        let user_id = Uuid::new_v4();
        let built = ClaimsBuilder::new().build(user_id, "a@b.test", &["Staff"], Some(&extra));

        let signed = built.claims.extra();
        assert_eq!(signed.get("is_dispatcher").map(String::as_str), Some("true"));
        assert_eq!(signed.get("depot_id").map(String::as_str), Some("17"));
        assert_eq!(signed.get("region").map(String::as_str), Some("north"));
        assert!(!signed.contains_key("nickname"));

        assert_eq!(built.metadata["is_dispatcher"], json!(true));
        assert_eq!(built.metadata["depot_id"], json!(17));
        assert_eq!(built.metadata["sub"], json!(user_id.to_string()));
        assert!(!built.metadata.contains_key("nickname"));
    }

    #[test]
    fn test_reserved_extras_dropped() {
        let mut extra = ExtraClaims::new();
        extra.insert("sub".to_string(), Some(ClaimValue::from("someone-else")));
        extra.insert("exp".to_string(), Some(ClaimValue::from(0i64)));
        extra.insert("role".to_string(), Some(ClaimValue::from("Admin")));

        let user_id = Uuid::new_v4();
        let built = ClaimsBuilder::new().build(user_id, "a@b.test", &["Staff"], Some(&extra));

        assert!(built.claims.extra().is_empty());
        assert_eq!(built.claims.user_id(), user_id);
        assert_eq!(built.metadata["sub"], json!(user_id.to_string()));
        assert_eq!(built.metadata["role"], json!(["Staff"]));
        assert!(!built.metadata.contains_key("exp"));
    }
}
