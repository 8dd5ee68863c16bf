//! # ShipTrack Core
//!
//! Credential issuance and refresh token rotation for the ShipTrack backend.
//! This crate contains domain entities, the token and credential services,
//! store interfaces with in-memory implementations, and error types.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod errors;

// Re-export commonly used types for convenience
pub use domain::entities::{
    AccessTokenClaims, ClaimValue, RefreshTokenParts, RefreshTokenRecord, Revocation, RevocationReason,
    TokenState,
};
pub use domain::value_objects::{AuditInfo, BuiltClaims, ClaimSet, CredentialPair};
pub use errors::{DomainError, DomainResult, TokenError, ValidationError};
pub use repositories::{
    CommitReport, InMemoryTokenStore, InMemoryUserDirectory, RecordPredicate, RefreshTokenStore,
    StoreOperation, UserDirectory,
};
pub use services::{
    AccessTokenIssuer, ClaimsBuilder, Clock, CredentialService, ExtraClaims, ManualClock,
    RefreshTokenRotator, StaleTokenReaper, SystemClock, TokenServiceConfig,
};
