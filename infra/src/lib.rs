//! # Infrastructure Layer
//!
//! Concrete implementations behind the ShipTrack credential services.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Database**: MySQL refresh token store and user directory using SQLx
//! - **Logging**: `tracing` subscriber setup
//! - **Bootstrap**: configuration loading and service wiring
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)

// Re-export core types for convenience
pub use st_core::errors::*;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Configuration loading and credential service wiring
#[cfg(feature = "mysql")]
pub mod bootstrap;

/// Tracing subscriber setup
pub mod logging;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// Configuration loaded but invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Service construction failed
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<st_shared::errors::ConfigError> for InfrastructureError {
    fn from(e: st_shared::errors::ConfigError) -> Self {
        InfrastructureError::Config(e.to_string())
    }
}
