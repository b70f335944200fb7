//! TLS configuration utilities
//!
//! Turns PEM key material into a validated, immutable configuration.
//!
//! ## Security Defaults
//! - ring crypto provider, chosen explicitly
//! - Private key must match the leaf certificate
//! - Safe default protocol versions (TLS 1.2 and 1.3)
//! - Client certificates verified against custom anchors when given

pub mod config;
pub mod pem;

pub use config::{build_tls_config, must_build_tls_config, TlsConfig};
pub use pem::TrustAnchors;
