//! Refresh token issuance and one-time-use rotation

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::entities::{RefreshTokenRecord, Revocation, RevocationReason, TokenState};
use crate::domain::value_objects::AuditInfo;
use crate::errors::{DomainError, TokenError};
use crate::repositories::{CommitReport, RefreshTokenStore, StoreOperation};

use super::config::TokenServiceConfig;
use super::hashing::{generate_opaque_value, hash_token};
use super::reaper::StaleTokenReaper;

/// A newly persisted refresh token and its raw value.
///
/// The raw value exists only here; the store keeps its hash.
#[derive(Clone)]
pub struct IssuedRefreshToken {
    pub raw_value: String,
    pub record: RefreshTokenRecord,
}

/// Result of a successful rotation
#[derive(Clone)]
pub struct RotationOutcome {
    /// Raw value of the successor
    pub raw_value: String,
    /// The successor as persisted
    pub record: RefreshTokenRecord,
    /// The presented record as it was before being revoked
    pub previous: RefreshTokenRecord,
}

impl fmt::Debug for IssuedRefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedRefreshToken")
            .field("raw_value", &"<redacted>")
            .field("record", &self.record)
            .finish()
    }
}

impl fmt::Debug for RotationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationOutcome")
            .field("raw_value", &"<redacted>")
            .field("record", &self.record)
            .field("previous", &self.previous)
            .finish()
    }
}

/// Issues refresh tokens and rotates them.
///
/// Every write goes through a single `commit_atomic` batch, so a rotation
/// either revokes the presented record and persists its successor together,
/// or changes nothing. Two concurrent rotations of the same value are
/// serialized by the store's compare-and-set on the revoke.
pub struct RefreshTokenRotator<S: RefreshTokenStore> {
    store: Arc<S>,
    reaper: StaleTokenReaper<S>,
    ttl: Duration,
}

impl<S: RefreshTokenStore> RefreshTokenRotator<S> {
    pub fn new(store: Arc<S>, config: &TokenServiceConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let reaper = StaleTokenReaper::new(Arc::clone(&store), config.retention());
        Ok(Self {
            store,
            reaper,
            ttl: config.refresh_token_ttl(),
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn reaper(&self) -> &StaleTokenReaper<S> {
        &self.reaper
    }

    /// Issue the first refresh token of a session.
    ///
    /// The user's stale tokens are purged in the same batch.
    pub async fn issue_initial(
        &self,
        user_id: Uuid,
        ip: Option<&str>,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<IssuedRefreshToken, DomainError> {
        let (raw_value, record) = self.mint(user_id, ip, now)?;

        let operations = vec![
            self.reaper.purge_operation(user_id, now),
            StoreOperation::Add(record.clone()),
        ];
        let report = self.commit(operations, cancel).await?;

        info!(
            user_id = %user_id,
            token_id = %record.id(),
            purged = report.removed,
            "Refresh token issued"
        );

        Ok(IssuedRefreshToken { raw_value, record })
    }

    /// Look up a presented value and require it to be Active.
    ///
    /// # Returns
    /// * `Err(TokenError::UnknownToken)` - No record has this hash
    /// * `Err(TokenError::NoLongerActive)` - Already revoked; presenting it again is logged as reuse
    /// * `Err(TokenError::Expired)` - Past its expiry
    pub async fn validate_presented(
        &self,
        presented: &str,
        now: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, DomainError> {
        if presented.is_empty() {
            return Err(DomainError::Validation {
                message: "refresh token is required".to_string(),
            });
        }

        let record = self
            .store
            .find_by_hash(&hash_token(presented))
            .await?
            .ok_or_else(|| {
                debug!("Unknown refresh token presented");
                DomainError::Token(TokenError::UnknownToken)
            })?;

        match record.state(now) {
            TokenState::Active => Ok(record),
            TokenState::Revoked => {
                warn!(
                    user_id = %record.user_id(),
                    token_id = %record.id(),
                    reason = record.revocation().map(|r| r.reason.as_str()).unwrap_or_default(),
                    "Revoked refresh token presented again"
                );
                Err(DomainError::Token(TokenError::NoLongerActive))
            }
            TokenState::Expired => Err(DomainError::Token(TokenError::Expired)),
        }
    }

    /// Replace an Active record with a fresh successor.
    ///
    /// One batch purges the user's stale tokens, revokes `current`, adds the
    /// successor and links it. A concurrent rotation that already revoked
    /// `current` makes this one fail with `DomainError::Conflict`.
    pub async fn rotate_record(
        &self,
        current: RefreshTokenRecord,
        ip: Option<&str>,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<RotationOutcome, DomainError> {
        match current.state(now) {
            TokenState::Active => {}
            TokenState::Revoked => return Err(DomainError::Token(TokenError::NoLongerActive)),
            TokenState::Expired => return Err(DomainError::Token(TokenError::Expired)),
        }

        let user_id = current.user_id();
        let (raw_value, successor) = self.mint(user_id, ip, now)?;

        let operations = vec![
            self.reaper.purge_operation(user_id, now),
            StoreOperation::MarkRevoked {
                id: current.id(),
                revocation: Revocation::new(RevocationReason::Rotated, now, ip.map(str::to_string)),
            },
            StoreOperation::Add(successor.clone()),
            StoreOperation::LinkReplacement {
                id: current.id(),
                replaced_by_token_hash: successor.token_hash().to_string(),
            },
        ];

        match self.commit(operations, cancel).await {
            Ok(report) => {
                info!(
                    user_id = %user_id,
                    token_id = %current.id(),
                    successor_id = %successor.id(),
                    purged = report.removed,
                    "Refresh token rotated"
                );
                Ok(RotationOutcome {
                    raw_value,
                    record: successor,
                    previous: current,
                })
            }
            Err(e @ DomainError::Conflict { .. }) => {
                warn!(
                    user_id = %user_id,
                    token_id = %current.id(),
                    error = %e,
                    "Refresh token rotation lost to a concurrent writer"
                );
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Validate a presented value and rotate it
    pub async fn rotate(
        &self,
        presented: &str,
        ip: Option<&str>,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<RotationOutcome, DomainError> {
        let current = self.validate_presented(presented, now).await?;
        self.rotate_record(current, ip, now, cancel).await
    }

    /// Revoke a presented value without issuing a successor (logout)
    pub async fn revoke(
        &self,
        presented: &str,
        ip: Option<&str>,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<RefreshTokenRecord, DomainError> {
        let current = self.validate_presented(presented, now).await?;

        let operations = vec![StoreOperation::MarkRevoked {
            id: current.id(),
            revocation: Revocation::new(RevocationReason::Revoked, now, ip.map(str::to_string)),
        }];
        self.commit(operations, cancel).await?;

        info!(user_id = %current.user_id(), token_id = %current.id(), "Refresh token revoked");
        Ok(current)
    }

    /// Follow `replaced_by_token_hash` links starting at `token_hash`.
    ///
    /// The chain stops at the first record that was never replaced or whose
    /// successor has been purged.
    pub async fn rotation_chain(&self, token_hash: &str) -> Result<Vec<RefreshTokenRecord>, DomainError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(token_hash.to_string());

        while let Some(hash) = next.take() {
            if !seen.insert(hash.clone()) {
                break;
            }
            let Some(record) = self.store.find_by_hash(&hash).await? else {
                break;
            };
            next = record.replaced_by_token_hash().map(str::to_string);
            chain.push(record);
        }

        Ok(chain)
    }

    fn mint(
        &self,
        user_id: Uuid,
        ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(String, RefreshTokenRecord), DomainError> {
        let raw_value = generate_opaque_value();
        let record = RefreshTokenRecord::new(
            user_id,
            hash_token(&raw_value),
            now,
            self.ttl,
            AuditInfo::new(ip.map(str::to_string), Some(user_id)),
        )?;
        Ok((raw_value, record))
    }

    async fn commit(
        &self,
        operations: Vec<StoreOperation>,
        cancel: &CancellationToken,
    ) -> Result<CommitReport, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DomainError::Cancelled),
            result = self.store.commit_atomic(operations) => result,
        }
    }
}
