//! Credential issuance configuration

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Minimum signing secret length in bytes (HS256 key size)
pub const MIN_SECRET_BYTES: usize = 32;

/// Allowed access token lifetime in minutes
pub const ACCESS_TTL_MINUTES_RANGE: std::ops::RangeInclusive<i64> = 1..=1440;

/// Allowed refresh token lifetime in days
pub const REFRESH_TTL_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=30;

/// Allowed retention window for inactive refresh tokens in days
pub const RETENTION_DAYS_RANGE: std::ops::RangeInclusive<i64> = 0..=3650;

const DEFAULT_SECRET: &str = "development-secret-please-change-in-production";

/// JWT signing and token lifetime configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Symmetric signing secret (at least 32 bytes)
    pub secret: String,

    /// JWT issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// JWT audience claim
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Access token lifetime in minutes
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: i64,

    /// Refresh token lifetime in days
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            issuer: default_issuer(),
            audience: default_audience(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_days: default_refresh_ttl(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set access token lifetime in minutes
    pub fn with_access_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_token_ttl_minutes = minutes;
        self
    }

    /// Set refresh token lifetime in days
    pub fn with_refresh_ttl_days(mut self, days: i64) -> Self {
        self.refresh_token_ttl_days = days;
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }

    /// Check every recognized option against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::SecretTooShort {
                min: MIN_SECRET_BYTES,
                actual: self.secret.len(),
            });
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "jwt.issuer".to_string(),
            });
        }
        if self.audience.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "jwt.audience".to_string(),
            });
        }
        if !ACCESS_TTL_MINUTES_RANGE.contains(&self.access_token_ttl_minutes) {
            return Err(ConfigError::OutOfRange {
                field: "jwt.access_token_ttl_minutes".to_string(),
                min: *ACCESS_TTL_MINUTES_RANGE.start(),
                max: *ACCESS_TTL_MINUTES_RANGE.end(),
                actual: self.access_token_ttl_minutes,
            });
        }
        if !REFRESH_TTL_DAYS_RANGE.contains(&self.refresh_token_ttl_days) {
            return Err(ConfigError::OutOfRange {
                field: "jwt.refresh_token_ttl_days".to_string(),
                min: *REFRESH_TTL_DAYS_RANGE.start(),
                max: *REFRESH_TTL_DAYS_RANGE.end(),
                actual: self.refresh_token_ttl_days,
            });
        }
        Ok(())
    }
}

/// Stale refresh token cleanup configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReaperConfig {
    /// Days an inactive token is kept after issuance before it may be purged.
    /// Zero purges every inactive token.
    #[serde(default)]
    pub retention_days: i64,
}

/// Complete credential configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// Stale token cleanup
    #[serde(default)]
    pub reaper: ReaperConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").unwrap_or(defaults.secret),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or(defaults.audience),
            access_token_ttl_minutes: env_or("JWT_ACCESS_TOKEN_TTL_MINUTES", defaults.access_token_ttl_minutes),
            refresh_token_ttl_days: env_or("JWT_REFRESH_TOKEN_TTL_DAYS", defaults.refresh_token_ttl_days),
        };

        Self {
            jwt,
            reaper: ReaperConfig {
                retention_days: env_or("REFRESH_TOKEN_RETENTION_DAYS", 0),
            },
        }
    }

    /// Validate the JWT section and the reaper window
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        if !RETENTION_DAYS_RANGE.contains(&self.reaper.retention_days) {
            return Err(ConfigError::OutOfRange {
                field: "reaper.retention_days".to_string(),
                min: *RETENTION_DAYS_RANGE.start(),
                max: *RETENTION_DAYS_RANGE.end(),
                actual: self.reaper.retention_days,
            });
        }
        Ok(())
    }
}

fn env_or(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn default_issuer() -> String {
    String::from("shiptrack")
}

fn default_audience() -> String {
    String::from("shiptrack-api")
}

fn default_access_ttl() -> i64 {
    15
}

fn default_refresh_ttl() -> i64 {
    7
}
