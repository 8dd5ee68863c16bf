//! Shared configuration and error response types for the ShipTrack
//! credential services.
//!
//! - Configuration types
//! - Error response structures and configuration errors

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{AppConfig, AuthConfig, DatabaseConfig, Environment, JwtConfig, LoggingConfig, ReaperConfig};
pub use errors::{error_codes, ConfigError, ErrorResponse, IntoErrorResponse};
