//! Error types for Artgate

use thiserror::Error;

/// Main error type for Artgate operations
#[derive(Error, Debug)]
pub enum ArtgateError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential store errors (snapshot file, lookups)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Credential vault errors
    #[error("Vault error: {0}")]
    Vault(String),

    /// Bearer token errors
    #[error("Token error: {0}")]
    Token(String),

    /// Proxy/HTTP errors
    #[error("Proxy error: {0}")]
    Proxy(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ArtgateError {
    fn from(e: serde_json::Error) -> Self {
        ArtgateError::Serialization(e.to_string())
    }
}

/// Result type alias for Artgate operations
pub type Result<T> = std::result::Result<T, ArtgateError>;
