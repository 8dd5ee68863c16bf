//! In-memory implementation of RefreshTokenStore
//!
//! Batches are applied to a staged copy under the write lock and swapped in
//! only when every operation succeeds.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{RefreshTokenRecord, Revocation};
use crate::errors::DomainError;

use super::r#trait::{CommitReport, RecordPredicate, RefreshTokenStore, StoreOperation};

/// In-memory token store keyed by token hash
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    tokens: Arc<RwLock<HashMap<String, RefreshTokenRecord>>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryTokenStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, in no particular order
    pub async fn snapshot(&self) -> Vec<RefreshTokenRecord> {
        self.tokens.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }

    /// Make the next `commit_atomic` fail after staging all of its operations.
    /// Used to check that a failed batch leaves nothing behind.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    fn apply(
        tokens: &mut HashMap<String, RefreshTokenRecord>,
        operation: StoreOperation,
        report: &mut CommitReport,
    ) -> Result<(), DomainError> {
        match operation {
            StoreOperation::Add(record) => {
                if tokens.contains_key(record.token_hash()) {
                    return Err(DomainError::Conflict {
                        message: "token hash already exists".to_string(),
                    });
                }
                tokens.insert(record.token_hash().to_string(), record);
                report.added += 1;
            }
            StoreOperation::MarkRevoked { id, revocation } => {
                let record = find_mut(tokens, id).ok_or_else(|| DomainError::Conflict {
                    message: format!("refresh token {} not found", id),
                })?;
                record.revoke(revocation)?;
            }
            StoreOperation::LinkReplacement { id, replaced_by_token_hash } => {
                let record = find_mut(tokens, id).ok_or_else(|| DomainError::Conflict {
                    message: format!("refresh token {} not found", id),
                })?;
                record.link_replacement(replaced_by_token_hash)?;
            }
            StoreOperation::RemoveWhere { user_id, predicate } => {
                let before = tokens.len();
                tokens.retain(|_, t| !(t.user_id() == user_id && predicate.matches(t)));
                report.removed += before - tokens.len();
            }
        }
        Ok(())
    }
}

fn find_mut(
    tokens: &mut HashMap<String, RefreshTokenRecord>,
    id: Uuid,
) -> Option<&mut RefreshTokenRecord> {
    tokens.values_mut().find(|t| t.id() == id)
}

#[async_trait]
impl RefreshTokenStore for InMemoryTokenStore {
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(token_hash).cloned())
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<RefreshTokenRecord>, DomainError> {
        let tokens = self.tokens.read().await;
        let mut found: Vec<_> = tokens
            .values()
            .filter(|t| t.user_id() == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| std::cmp::Reverse(t.issued_at()));
        Ok(found)
    }

    async fn add(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(record.token_hash()) {
            return Err(DomainError::Conflict {
                message: "token hash already exists".to_string(),
            });
        }

        tokens.insert(record.token_hash().to_string(), record.clone());
        Ok(record)
    }

    async fn mark_revoked(&self, id: Uuid, revocation: &Revocation) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;

        match find_mut(&mut tokens, id) {
            Some(record) => Ok(record.revoke(revocation.clone()).is_ok()),
            None => Ok(false),
        }
    }

    async fn link_replacement(&self, id: Uuid, replaced_by_token_hash: &str) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;

        match find_mut(&mut tokens, id) {
            Some(record) => Ok(record.link_replacement(replaced_by_token_hash.to_string()).is_ok()),
            None => Ok(false),
        }
    }

    async fn remove_where(&self, user_id: Uuid, predicate: RecordPredicate) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();

        tokens.retain(|_, t| !(t.user_id() == user_id && predicate.matches(t)));

        Ok(before - tokens.len())
    }

    async fn commit_atomic(&self, operations: Vec<StoreOperation>) -> Result<CommitReport, DomainError> {
        let mut tokens = self.tokens.write().await;
        let mut staged = tokens.clone();
        let mut report = CommitReport::default();

        for operation in operations {
            Self::apply(&mut staged, operation, &mut report)?;
        }

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(DomainError::Internal {
                message: "simulated commit failure".to_string(),
            });
        }

        *tokens = staged;
        Ok(report)
    }
}
