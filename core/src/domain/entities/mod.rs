//! Domain entities for credential issuance.

pub mod claims;
pub mod refresh_token;

pub use claims::{AccessTokenClaims, ClaimValue, RESERVED_CLAIMS};
pub use refresh_token::{
    RefreshTokenParts, RefreshTokenRecord, Revocation, RevocationReason, TokenState,
};
