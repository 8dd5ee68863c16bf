//! HS256 access token issuance and validation

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::entities::AccessTokenClaims;
use crate::domain::value_objects::ClaimSet;
use crate::errors::{DomainError, TokenError};
use crate::services::clock::Clock;

use super::config::TokenServiceConfig;

/// A freshly signed access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAccessToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and validates access tokens with a symmetric key.
///
/// Only HS256 is accepted on validation; tokens announcing any other
/// algorithm, including `none`, are rejected before the signature is checked.
pub struct AccessTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl AccessTokenIssuer {
    /// Creates a new issuer
    ///
    /// # Returns
    ///
    /// An error when the secret is shorter than 32 bytes or a lifetime is not positive
    pub fn new(config: &TokenServiceConfig, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        // Time-based checks run against the injected clock in `validate`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: config.access_token_ttl(),
            clock,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token valid over `[now, now + ttl)`
    pub fn issue(&self, claims: &ClaimSet, now: DateTime<Utc>) -> Result<IssuedAccessToken, DomainError> {
        let jti = Uuid::new_v4().to_string();
        let expires_at = now + self.ttl;

        let payload = AccessTokenClaims {
            sub: claims.user_id().to_string(),
            email: claims.email().to_string(),
            role: claims.roles().to_vec(),
            jti: jti.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            extra: claims.extra().clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to sign access token: {}", e),
            })?;

        Ok(IssuedAccessToken {
            token,
            jti,
            expires_at: Utc
                .timestamp_opt(expires_at.timestamp(), 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    /// Verify signature, algorithm, issuer and audience, then the validity window.
    ///
    /// With `allow_expired` the expiry check is skipped; everything else still applies.
    pub fn validate(&self, token: &str, allow_expired: bool) -> Result<AccessTokenClaims, DomainError> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "Access token rejected");
                DomainError::Token(map_jwt_error(e.kind()))
            })?;
        let claims = data.claims;

        let now = self.clock.now().timestamp();
        if claims.nbf > now {
            return Err(DomainError::Token(TokenError::TokenNotYetValid));
        }
        if !allow_expired && now >= claims.exp {
            return Err(DomainError::Token(TokenError::Expired));
        }
        claims.user_id()?;

        Ok(claims)
    }
}

fn map_jwt_error(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::TokenNotYetValid,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::MissingRequiredClaim(_) => TokenError::InvalidClaims,
        _ => TokenError::InvalidTokenFormat,
    }
}
