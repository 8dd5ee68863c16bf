//! Per-user purge of refresh tokens that can no longer be used.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::DomainError;
use crate::repositories::{RecordPredicate, RefreshTokenStore, StoreOperation};

/// Removes a user's revoked or expired refresh tokens once they are older
/// than the retention window. Active tokens are never touched.
pub struct StaleTokenReaper<S: RefreshTokenStore> {
    store: Arc<S>,
    retention: Duration,
}

impl<S: RefreshTokenStore> Clone for StaleTokenReaper<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            retention: self.retention,
        }
    }
}

impl<S: RefreshTokenStore> StaleTokenReaper<S> {
    pub fn new(store: Arc<S>, retention: Duration) -> Self {
        Self { store, retention }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Predicate selecting what a purge at `now` removes
    pub fn predicate(&self, now: DateTime<Utc>) -> RecordPredicate {
        RecordPredicate::Inactive {
            as_of: now,
            issued_before: now - self.retention,
        }
    }

    /// The purge as a batch operation, for callers that commit it together with other writes
    pub fn purge_operation(&self, user_id: Uuid, now: DateTime<Utc>) -> StoreOperation {
        StoreOperation::RemoveWhere {
            user_id,
            predicate: self.predicate(now),
        }
    }

    /// Purge on its own
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records removed
    /// * `Err(DomainError)` - Storage error
    pub async fn purge(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<usize, DomainError> {
        match self.store.remove_where(user_id, self.predicate(now)).await {
            Ok(removed) => {
                if removed > 0 {
                    info!(user_id = %user_id, removed, "Purged stale refresh tokens");
                }
                Ok(removed)
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to purge stale refresh tokens");
                Err(e)
            }
        }
    }
}
