//! Opaque refresh value generation and hashing

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes behind every refresh value
pub const REFRESH_TOKEN_BYTES: usize = 48;

/// Generate a new opaque refresh value: 48 bytes from the OS CSPRNG,
/// base64url without padding (64 characters).
pub fn generate_opaque_value() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of the value's UTF-8 bytes as lowercase hex. Only this is persisted.
pub fn hash_token(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}
