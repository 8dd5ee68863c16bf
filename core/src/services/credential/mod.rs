//! Credential facade: login issuance, refresh, logout

mod service;


pub use service::CredentialService;
