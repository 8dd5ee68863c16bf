//! Configuration for the token services

use chrono::Duration;
use st_shared::config::{
    AuthConfig, ACCESS_TTL_MINUTES_RANGE, MIN_SECRET_BYTES, REFRESH_TTL_DAYS_RANGE,
    RETENTION_DAYS_RANGE,
};

use crate::errors::DomainError;

/// Configuration for the token services
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// `iss` claim written and required
    pub issuer: String,
    /// `aud` claim written and required
    pub audience: String,
    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,
    /// Refresh token expiry in days
    pub refresh_token_expiry_days: i64,
    /// How long inactive refresh tokens are kept before purging, in days
    pub retention_days: i64,
}

impl TokenServiceConfig {
    pub fn access_token_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_expiry_minutes)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_expiry_days)
    }

    pub fn retention(&self) -> Duration {
        Duration::days(self.retention_days)
    }

    /// Check the values the services cannot work without
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(DomainError::Validation {
                message: format!(
                    "JWT secret must be at least {} bytes, got {}",
                    MIN_SECRET_BYTES,
                    self.jwt_secret.len()
                ),
            });
        }
        if self.issuer.trim().is_empty() || self.audience.trim().is_empty() {
            return Err(DomainError::Validation {
                message: "JWT issuer and audience must not be empty".to_string(),
            });
        }
        check_range(
            "access_token_expiry_minutes",
            self.access_token_expiry_minutes,
            &ACCESS_TTL_MINUTES_RANGE,
        )?;
        check_range(
            "refresh_token_expiry_days",
            self.refresh_token_expiry_days,
            &REFRESH_TTL_DAYS_RANGE,
        )?;
        check_range("retention_days", self.retention_days, &RETENTION_DAYS_RANGE)
    }
}

fn check_range(
    field: &str,
    value: i64,
    range: &std::ops::RangeInclusive<i64>,
) -> Result<(), DomainError> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(DomainError::Validation {
        message: format!(
            "{} must be between {} and {}, got {}",
            field,
            range.start(),
            range.end(),
            value
        ),
    })
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            issuer: "shiptrack".to_string(),
            audience: "shiptrack-api".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
            retention_days: 0,
        }
    }
}

impl std::fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("jwt_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_expiry_minutes", &self.access_token_expiry_minutes)
            .field("refresh_token_expiry_days", &self.refresh_token_expiry_days)
            .field("retention_days", &self.retention_days)
            .finish()
    }
}

impl TryFrom<&AuthConfig> for TokenServiceConfig {
    type Error = DomainError;

    fn try_from(auth: &AuthConfig) -> Result<Self, Self::Error> {
        auth.validate()?;

        let config = Self {
            jwt_secret: auth.jwt.secret.clone(),
            issuer: auth.jwt.issuer.clone(),
            audience: auth.jwt.audience.clone(),
            access_token_expiry_minutes: auth.jwt.access_token_ttl_minutes,
            refresh_token_expiry_days: auth.jwt.refresh_token_ttl_days,
            retention_days: auth.reaper.retention_days,
        };
        config.validate()?;
        Ok(config)
    }
}
