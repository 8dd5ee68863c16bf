//! Business services containing credential logic and use cases.

pub mod clock;
pub mod credential;
pub mod token;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::CredentialService;
pub use token::{
    AccessTokenIssuer, ClaimsBuilder, ExtraClaims, IssuedAccessToken, IssuedRefreshToken,
    RefreshTokenRotator, RotationOutcome, StaleTokenReaper, TokenServiceConfig,
};
