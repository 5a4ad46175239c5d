//! CSP nonce generation.
//!
//! Nonces come straight from the operating system CSPRNG. If that source is
//! unavailable the request fails; there is no fallback generator.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Length of the raw random bytes (16 bytes = 128 bits).
pub const NONCE_BYTES_LEN: usize = 16;

/// The secure random source could not produce bytes.
#[derive(Debug, Error)]
#[error("secure random source unavailable: {0}")]
pub struct NonceError(#[from] rand::Error);

/// A base64-encoded, single-use CSP nonce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonce(String);

impl Nonce {
    /// Draw a fresh nonce from the OS random source.
    pub fn generate() -> Result<Self, NonceError> {
        let mut bytes = [0u8; NONCE_BYTES_LEN];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(Self(STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a nonce and return its encoded form.
pub fn generate_nonce() -> Result<String, NonceError> {
    Nonce::generate().map(|nonce| nonce.0)
}
