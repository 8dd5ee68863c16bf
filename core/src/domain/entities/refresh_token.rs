//! Refresh token record stored by the token store.
//!
//! Only the SHA-256 hash of the opaque value is kept. A record moves from
//! Active to Revoked exactly once; expiry is derived from the clock and never
//! written.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::AuditInfo;
use crate::errors::DomainError;

/// Why a record was revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RevocationReason {
    /// Replaced by a successor during rotation
    Rotated,
    /// Explicitly revoked (logout)
    Revoked,
}

impl RevocationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Rotated => "Rotated",
            RevocationReason::Revoked => "Revoked",
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevocationReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Rotated" => Ok(RevocationReason::Rotated),
            "Revoked" => Ok(RevocationReason::Revoked),
            other => Err(DomainError::Internal {
                message: format!("Unknown revocation reason: {}", other),
            }),
        }
    }
}

/// Revocation details. All three are written together, once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revocation {
    pub revoked_at: DateTime<Utc>,
    pub revoked_by_ip: Option<String>,
    pub reason: RevocationReason,
}

impl Revocation {
    pub fn new(reason: RevocationReason, revoked_at: DateTime<Utc>, revoked_by_ip: Option<String>) -> Self {
        Self {
            revoked_at,
            revoked_by_ip,
            reason,
        }
    }
}

/// Lifecycle state of a record at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Revoked,
    Expired,
}

/// Raw column values used by store adapters to rebuild a record
#[derive(Debug, Clone)]
pub struct RefreshTokenParts {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub audit: AuditInfo,
    pub revocation: Option<Revocation>,
    pub replaced_by_token_hash: Option<String>,
}

/// One issued refresh credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshTokenRecord {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    audit: AuditInfo,
    revocation: Option<Revocation>,
    replaced_by_token_hash: Option<String>,
}

impl RefreshTokenRecord {
    /// Creates a new Active record valid for `ttl` from `issued_at`
    ///
    /// # Errors
    ///
    /// `DomainError::Validation` when `ttl` is not positive or the hash is empty
    pub fn new(
        user_id: Uuid,
        token_hash: String,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        audit: AuditInfo,
    ) -> Result<Self, DomainError> {
        Self::restore(RefreshTokenParts {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            issued_at,
            expires_at: issued_at + ttl,
            audit,
            revocation: None,
            replaced_by_token_hash: None,
        })
    }

    /// Rebuilds a record from stored values, re-checking the structural invariants
    pub fn restore(parts: RefreshTokenParts) -> Result<Self, DomainError> {
        if parts.token_hash.is_empty() {
            return Err(DomainError::Validation {
                message: "token hash must not be empty".to_string(),
            });
        }
        if parts.expires_at <= parts.issued_at {
            return Err(DomainError::Validation {
                message: "refresh token must expire after it is issued".to_string(),
            });
        }

        Ok(Self {
            id: parts.id,
            user_id: parts.user_id,
            token_hash: parts.token_hash,
            issued_at: parts.issued_at,
            expires_at: parts.expires_at,
            audit: parts.audit,
            revocation: parts.revocation,
            replaced_by_token_hash: parts.replaced_by_token_hash,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn token_hash(&self) -> &str {
        &self.token_hash
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    pub fn revocation(&self) -> Option<&Revocation> {
        self.revocation.as_ref()
    }

    pub fn replaced_by_token_hash(&self) -> Option<&str> {
        self.replaced_by_token_hash.as_deref()
    }

    /// `now >= expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revocation.is_some()
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && !self.is_revoked()
    }

    /// Revoked takes precedence over Expired
    pub fn state(&self, now: DateTime<Utc>) -> TokenState {
        if self.is_revoked() {
            TokenState::Revoked
        } else if self.is_expired(now) {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }

    /// Marks the record revoked
    ///
    /// # Errors
    ///
    /// `DomainError::Conflict` if the record was already revoked
    pub fn revoke(&mut self, revocation: Revocation) -> Result<(), DomainError> {
        if self.revocation.is_some() {
            return Err(DomainError::Conflict {
                message: format!("refresh token {} already revoked", self.id),
            });
        }
        self.revocation = Some(revocation);
        Ok(())
    }

    /// Records the hash of the successor issued by rotation
    ///
    /// # Errors
    ///
    /// `DomainError::Conflict` if a successor was already linked
    pub fn link_replacement(&mut self, successor_hash: String) -> Result<(), DomainError> {
        if self.replaced_by_token_hash.is_some() {
            return Err(DomainError::Conflict {
                message: format!("refresh token {} already replaced", self.id),
            });
        }
        self.replaced_by_token_hash = Some(successor_hash);
        Ok(())
    }

    /// Time remaining until expiration, zero once expired
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}
