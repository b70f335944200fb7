//! Error types for secutil
//!
//! We use `thiserror` for structured error types that can be matched on.
//! Binaries wrap these in `anyhow` at the top level.

use thiserror::Error;

/// Central error type for secutil operations
#[derive(Error, Debug)]
pub enum SecError {
    // === Randomness ===
    #[error("Entropy source failure: {0}")]
    EntropySource(String),

    // === Key material ===
    #[error("Malformed certificate: {0}")]
    MalformedCertificate(String),

    #[error("Malformed private key: {0}")]
    MalformedKey(String),

    #[error("Private key does not match certificate: {0}")]
    KeyPairMismatch(String),

    // === TLS assembly ===
    #[error("TLS error: {0}")]
    TlsError(String),

    // === Configuration ===
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using SecError
pub type Result<T> = std::result::Result<T, SecError>;

impl From<rustls::Error> for SecError {
    fn from(err: rustls::Error) -> Self {
        SecError::TlsError(err.to_string())
    }
}

impl From<config::ConfigError> for SecError {
    fn from(err: config::ConfigError) -> Self {
        SecError::ConfigError(err.to_string())
    }
}

impl From<rand::Error> for SecError {
    fn from(err: rand::Error) -> Self {
        SecError::EntropySource(err.to_string())
    }
}
