//! Value objects representing immutable domain concepts.

pub mod audit_info;
pub mod claim_set;
pub mod credential_pair;

// Re-export commonly used types
pub use audit_info::AuditInfo;
pub use claim_set::{BuiltClaims, ClaimSet};
pub use credential_pair::CredentialPair;
