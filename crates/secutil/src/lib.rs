//! # secutil
//!
//! Small security helpers shared by services:
//! - Hex nonces from a cryptographically secure, injectable entropy source
//! - An injectable clock
//! - rustls configuration from PEM certificate, key and CA bundle
//!
//! Randomness and time go through [`providers`] so tests can pin them
//! without changing production call sites.

pub mod clock;
pub mod error;
pub mod nonce;
pub mod providers;
pub mod settings;
pub mod tls;

// Re-export commonly used items at crate root
pub use clock::{now, Clock, FixedClock, ManualClock, SystemClock};
pub use error::{Result, SecError};
pub use nonce::{nonce_str, try_nonce_str, EntropySource, NonceGenerator, OsEntropy};
pub use providers::Providers;
pub use settings::{TlsMaterial, TlsSettings};
pub use tls::{build_tls_config, must_build_tls_config, TlsConfig};
