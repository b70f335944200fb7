//! Where TLS key material lives
//!
//! Applications that keep their certificate and key on disk can describe the
//! locations in a TOML file and/or `SECUTIL__*` environment variables:
//!
//! ```toml
//! cert_path = "/etc/service/tls.crt"
//! key_path = "/etc/service/tls.key"
//! # Optional; omit to use the default trust store
//! ca_path = "/etc/service/ca.crt"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;
use crate::tls::{build_tls_config, TlsConfig};

/// Environment variable prefix, e.g. `SECUTIL__CERT_PATH`
pub const ENV_PREFIX: &str = "SECUTIL";

/// Paths to PEM files
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TlsSettings {
    /// Certificate (chain), leaf first
    pub cert_path: PathBuf,

    /// Private key matching the leaf certificate
    pub key_path: PathBuf,

    /// CA bundle for verifying peers
    #[serde(default)]
    pub ca_path: Option<PathBuf>,
}

/// PEM bytes read from [`TlsSettings`] paths
#[derive(Clone, Default)]
pub struct TlsMaterial {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
    /// Empty when no CA bundle is configured
    pub ca_pem: Vec<u8>,
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("cert_pem", &self.cert_pem.len())
            .field("key_pem", &"<redacted>")
            .field("ca_pem", &self.ca_pem.len())
            .finish()
    }
}

impl TlsSettings {
    /// Load settings from an optional file, then the environment.
    ///
    /// Environment variables override values from the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings: TlsSettings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Read the configured files.
    pub fn read_material(&self) -> Result<TlsMaterial> {
        let cert_pem = std::fs::read(&self.cert_path)?;
        let key_pem = std::fs::read(&self.key_path)?;
        let ca_pem = match &self.ca_path {
            Some(path) => std::fs::read(path)?,
            None => Vec::new(),
        };

        Ok(TlsMaterial {
            cert_pem,
            key_pem,
            ca_pem,
        })
    }

    /// Read the configured files and build a [`TlsConfig`] from them.
    pub fn build(&self) -> Result<TlsConfig> {
        let material = self.read_material()?;
        tracing::debug!(
            cert = %self.cert_path.display(),
            key = %self.key_path.display(),
            ca = ?self.ca_path,
            "Loaded TLS key material"
        );
        build_tls_config(&material.cert_pem, &material.key_pem, &material.ca_pem)
    }
}
