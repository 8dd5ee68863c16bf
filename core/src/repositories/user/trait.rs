//! User directory trait: the credential subsystem's read-only view of users.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::DomainError;

/// Read access to the user and role store
///
/// Implementations are consulted at login and again at every refresh, so role
/// changes take effect on the next rotation.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Current roles of the user. Unknown users have no roles.
    async fn resolve_roles(&self, user_id: Uuid) -> Result<Vec<String>, DomainError>;

    /// Current email of the user
    ///
    /// # Returns
    /// * `Ok(Some(email))` - User exists
    /// * `Ok(None)` - No such user
    async fn resolve_email(&self, user_id: Uuid) -> Result<Option<String>, DomainError>;

    /// Whether the user exists and may hold credentials
    async fn is_active(&self, user_id: Uuid) -> Result<bool, DomainError>;
}
