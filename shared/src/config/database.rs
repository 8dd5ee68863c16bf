//! Connection settings for the MySQL refresh token store

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ConfigError;

/// Concurrent refreshes each hold a connection for one short transaction
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// MySQL pool settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// `mysql://` connection URL
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a free connection before a store call fails
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,

    /// Statements slower than this are logged at warn level
    #[serde(default = "default_slow_statement_ms")]
    pub slow_statement_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("mysql://localhost:3306/shiptrack")
    }
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_lifetime_secs: default_max_lifetime_secs(),
            slow_statement_ms: default_slow_statement_ms(),
        }
    }

    /// Read `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS` and
    /// `DATABASE_ACQUIRE_TIMEOUT_SECS`; anything unset keeps its default.
    pub fn from_env() -> Self {
        let mut config = match std::env::var("DATABASE_URL") {
            Ok(url) => Self::new(url),
            Err(_) => Self::default(),
        };
        if let Some(max) = env_parse("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = max;
        }
        if let Some(secs) = env_parse("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            config.acquire_timeout_secs = secs;
        }
        config
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout_secs = timeout.as_secs();
        self
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    pub fn slow_statement_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_statement_ms)
    }

    /// The store only speaks MySQL and needs at least one connection
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.starts_with("mysql://") {
            return Err(ConfigError::Missing {
                field: "database.url (mysql://)".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(ConfigError::OutOfRange {
                field: "database.max_connections".to_string(),
                min: 1,
                max: i64::from(u32::MAX),
                actual: 0,
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_max_lifetime_secs() -> u64 {
    1800
}

fn default_slow_statement_ms() -> u64 {
    250
}
