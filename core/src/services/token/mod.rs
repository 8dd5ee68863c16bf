//! Token services
//!
//! - `issuer` - HS256 access token signing and validation
//! - `claims_builder` - Claim set assembly for access tokens
//! - `rotator` - Refresh token issuance and one-time-use rotation
//! - `reaper` - Purge of revoked and expired refresh tokens
//! - `hashing` - Opaque refresh values and their stored hash

mod claims_builder;
mod config;
mod hashing;
mod issuer;
mod reaper;
mod rotator;

#[cfg(test)]
mod tests;

pub use claims_builder::{ClaimsBuilder, ExtraClaims};
pub use config::TokenServiceConfig;
pub use hashing::{generate_opaque_value, hash_token, REFRESH_TOKEN_BYTES};
pub use issuer::{AccessTokenIssuer, IssuedAccessToken};
pub use reaper::StaleTokenReaper;
pub use rotator::{IssuedRefreshToken, RefreshTokenRotator, RotationOutcome};
