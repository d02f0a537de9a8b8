//! Credential vault for upstream API keys
//!
//! Secrets are obfuscated with a repeating-key XOR over their UTF-8 bytes,
//! keyed by the server-wide secret, and stored as standard base64 text.
//!
//! This is placeholder-grade obfuscation, not encryption: there is no nonce,
//! no salt and no authentication tag, so equal plaintexts produce equal blobs
//! and anyone holding the server secret can recover every stored key. The
//! format is kept byte-compatible with records written by earlier deployments
//! (for ASCII keys and secrets), so changing the cipher means migrating every
//! stored record.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::error::{ArtgateError, Result};

/// Failure to recover a plaintext secret from a stored blob
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    /// Blob is not valid base64
    #[error("stored secret is not valid base64")]
    InvalidEncoding,

    /// Decoded bytes do not form a UTF-8 string
    #[error("stored secret does not decode to UTF-8 text")]
    InvalidUtf8,
}

/// A plaintext secret that never shows up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the plaintext. Only call this at the point of forwarding.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***, {} bytes)", self.0.len())
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Reversible obfuscation keyed by the server-wide secret
#[derive(Clone)]
pub struct Vault {
    key: Vec<u8>,
}

impl Vault {
    /// Create a vault from the server secret. The key must not be empty.
    pub fn new(server_secret: &str) -> Result<Self> {
        if server_secret.is_empty() {
            return Err(ArtgateError::Vault(
                "server secret must not be empty".to_string(),
            ));
        }
        Ok(Self {
            key: server_secret.as_bytes().to_vec(),
        })
    }

    /// Obfuscate a plaintext secret into a storable blob
    pub fn encrypt(&self, secret: &str) -> String {
        STANDARD.encode(self.apply(secret.as_bytes()))
    }

    /// Recover a plaintext secret from a stored blob
    pub fn decrypt(&self, blob: &str) -> std::result::Result<Secret, DecryptionError> {
        let bytes = STANDARD
            .decode(blob.trim())
            .map_err(|_| DecryptionError::InvalidEncoding)?;
        let plain = String::from_utf8(self.apply(&bytes))
            .map_err(|_| DecryptionError::InvalidUtf8)?;
        Ok(Secret(plain))
    }

    fn apply(&self, input: &[u8]) -> Vec<u8> {
        input
            .iter()
            .zip(self.key.iter().cycle())
            .map(|(b, k)| b ^ k)
            .collect()
    }
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault").finish_non_exhaustive()
    }
}
