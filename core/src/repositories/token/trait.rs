//! Refresh token store trait defining the interface for record persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{RefreshTokenRecord, Revocation};
use crate::errors::DomainError;

/// Filter for bulk removal. A closed set so SQL adapters can translate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPredicate {
    /// Revoked or expired as of `as_of`, and issued at or before `issued_before`
    Inactive {
        as_of: DateTime<Utc>,
        issued_before: DateTime<Utc>,
    },
}

impl RecordPredicate {
    /// Evaluate against a record in memory
    pub fn matches(&self, record: &RefreshTokenRecord) -> bool {
        match *self {
            RecordPredicate::Inactive { as_of, issued_before } => {
                !record.is_active(as_of) && record.issued_at() <= issued_before
            }
        }
    }
}

/// One write inside an atomic batch
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Insert a new record. A duplicate hash aborts the batch.
    Add(RefreshTokenRecord),

    /// Compare-and-set revoke. Aborts the batch unless the record exists and is not revoked.
    MarkRevoked { id: Uuid, revocation: Revocation },

    /// Write-once successor link. Aborts the batch unless the record exists and is unlinked.
    LinkReplacement { id: Uuid, replaced_by_token_hash: String },

    /// Delete the user's records matching the predicate
    RemoveWhere { user_id: Uuid, predicate: RecordPredicate },
}

/// Summary of a committed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Records added
    pub added: usize,
    /// Records deleted by `RemoveWhere`
    pub removed: usize,
}

/// Store trait for refresh token records, keyed by token hash
///
/// # Atomicity
/// `commit_atomic` applies every operation or none of them, isolated from
/// other batches. Its compare-and-set semantics are the only concurrency gate
/// the rotator relies on: of two batches revoking the same record, exactly
/// one commits and the other fails with `DomainError::Conflict`.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Find a record by the hash of its opaque value
    ///
    /// # Returns
    /// * `Ok(Some(record))` - Record found (in any state)
    /// * `Ok(None)` - No record has this hash
    /// * `Err(DomainError)` - Storage error
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError>;

    /// All records of a user, in any state, newest first
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<RefreshTokenRecord>, DomainError>;

    /// Insert a single record
    ///
    /// # Returns
    /// * `Err(DomainError::Conflict)` - The hash is already stored
    async fn add(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError>;

    /// Revoke a single record if it is not revoked yet
    ///
    /// # Returns
    /// * `Ok(true)` - The record transitioned to Revoked
    /// * `Ok(false)` - Not found or already revoked
    async fn mark_revoked(&self, id: Uuid, revocation: &Revocation) -> Result<bool, DomainError>;

    /// Link a successor hash if none is linked yet
    ///
    /// # Returns
    /// * `Ok(true)` - Link written
    /// * `Ok(false)` - Not found or already linked
    async fn link_replacement(&self, id: Uuid, replaced_by_token_hash: &str) -> Result<bool, DomainError>;

    /// Delete a user's records matching `predicate`
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records deleted
    async fn remove_where(&self, user_id: Uuid, predicate: RecordPredicate) -> Result<usize, DomainError>;

    /// Apply a batch of operations as one atomic, isolated unit
    ///
    /// # Returns
    /// * `Ok(CommitReport)` - Every operation applied
    /// * `Err(DomainError::Conflict)` - A compare-and-set or uniqueness check failed; nothing applied
    /// * `Err(DomainError)` - Storage error; nothing applied
    async fn commit_atomic(&self, operations: Vec<StoreOperation>) -> Result<CommitReport, DomainError>;
}
