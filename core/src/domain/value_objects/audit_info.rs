//! Issuance provenance embedded in stored records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who created a record and from where
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    /// Client IP of the issuing request
    pub created_by_ip: Option<String>,

    /// Principal on whose behalf the record was created
    pub created_by_user_id: Option<Uuid>,
}

impl AuditInfo {
    pub fn new(created_by_ip: Option<String>, created_by_user_id: Option<Uuid>) -> Self {
        Self {
            created_by_ip,
            created_by_user_id,
        }
    }
}
