//! TLS configuration from PEM key material
//!
//! [`build_tls_config`] validates a certificate/key pair (and an optional CA
//! bundle) and returns an immutable [`TlsConfig`]. Transports turn that into
//! a `rustls::ClientConfig` or `rustls::ServerConfig`.
//!
//! ```no_run
//! # fn read(_: &str) -> Vec<u8> { Vec::new() }
//! let tls = secutil::build_tls_config(read("client.crt"), read("client.key"), read("ca.crt"))?;
//! let client = tls.client_config()?;
//! # Ok::<(), secutil::SecError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::sign::CertifiedKey;
use rustls::{ClientConfig, InconsistentKeys, RootCertStore, ServerConfig};
use sha2::{Digest, Sha256};

use crate::error::{Result, SecError};
use crate::tls::pem::{parse_certificate_chain, parse_private_key, parse_trust_anchors};

/// Validated identity plus optional trust anchors, ready to hand to a
/// transport. Cloning shares the underlying data.
#[derive(Clone)]
pub struct TlsConfig {
    provider: Arc<CryptoProvider>,
    cert_chain: Vec<CertificateDer<'static>>,
    key: Arc<PrivateKeyDer<'static>>,
    certified_key: Arc<CertifiedKey>,
    trust_anchors: Option<Arc<RootCertStore>>,
    skipped_trust_anchors: usize,
}

/// Build a [`TlsConfig`] from a PEM certificate (chain), its PEM private key,
/// and an optional PEM CA bundle.
///
/// An empty `ca_pem` leaves the trust anchors unset, meaning "use the default
/// trust store". Malformed entries inside a non-empty bundle are skipped.
pub fn build_tls_config(
    cert_pem: impl AsRef<[u8]>,
    key_pem: impl AsRef<[u8]>,
    ca_pem: impl AsRef<[u8]>,
) -> Result<TlsConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    // key/cert pair
    let cert_chain = parse_certificate_chain(cert_pem.as_ref())?;
    let key = parse_private_key(key_pem.as_ref())?;

    let signing_key = provider
        .key_provider
        .load_private_key(key.clone_key())
        .map_err(|e| SecError::MalformedKey(format!("Unsupported private key: {}", e)))?;

    let certified_key = CertifiedKey::new(cert_chain.clone(), signing_key);
    check_key_pair(&certified_key)?;

    // Custom CA if provided, otherwise the consumer's default roots
    let ca_pem = ca_pem.as_ref();
    let (trust_anchors, skipped_trust_anchors) = if ca_pem.is_empty() {
        (None, 0)
    } else {
        let anchors = parse_trust_anchors(ca_pem);
        (Some(Arc::new(anchors.store)), anchors.skipped)
    };

    let config = TlsConfig {
        provider,
        cert_chain,
        key: Arc::new(key),
        certified_key: Arc::new(certified_key),
        trust_anchors,
        skipped_trust_anchors,
    };

    tracing::debug!(
        fingerprint = %config.fingerprint(),
        chain_len = config.cert_chain.len(),
        trust_anchors = config.trust_anchors.as_ref().map(|r| r.len()),
        skipped = config.skipped_trust_anchors,
        "Built TLS configuration"
    );

    Ok(config)
}

/// Same as [`build_tls_config`], but panics if the material is unusable.
///
/// Intended for startup, where a bad certificate means the service cannot run.
pub fn must_build_tls_config(
    cert_pem: impl AsRef<[u8]>,
    key_pem: impl AsRef<[u8]>,
    ca_pem: impl AsRef<[u8]>,
) -> TlsConfig {
    match build_tls_config(cert_pem, key_pem, ca_pem) {
        Ok(config) => config,
        Err(e) => panic!("invalid TLS key material: {e}"),
    }
}

fn check_key_pair(certified_key: &CertifiedKey) -> Result<()> {
    match certified_key.keys_match() {
        Ok(()) => Ok(()),
        Err(rustls::Error::InconsistentKeys(InconsistentKeys::KeyMismatch)) => {
            Err(SecError::KeyPairMismatch(
                "certificate public key differs from private key".to_string(),
            ))
        }
        Err(rustls::Error::InconsistentKeys(other)) => Err(SecError::KeyPairMismatch(format!(
            "cannot confirm key pair: {:?}",
            other
        ))),
        Err(e) => Err(SecError::MalformedCertificate(format!(
            "Failed to parse leaf certificate: {}",
            e
        ))),
    }
}

impl TlsConfig {
    /// Certificate chain, leaf first
    pub fn certificate_chain(&self) -> &[CertificateDer<'static>] {
        &self.cert_chain
    }

    /// Chain and signing key as rustls uses them in a handshake
    pub fn certified_key(&self) -> &Arc<CertifiedKey> {
        &self.certified_key
    }

    /// Custom trust anchors, or `None` for the default trust store
    pub fn trust_anchors(&self) -> Option<&Arc<RootCertStore>> {
        self.trust_anchors.as_ref()
    }

    /// Number of CA bundle entries that were skipped as malformed
    pub fn skipped_trust_anchors(&self) -> usize {
        self.skipped_trust_anchors
    }

    /// SHA-256 of the leaf certificate, lowercase hex
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.cert_chain[0].as_ref());
        hex::encode(hasher.finalize())
    }

    /// Client configuration presenting this identity.
    ///
    /// The server is verified against the custom anchors, or the bundled
    /// web PKI roots when none were given.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let roots = match &self.trust_anchors {
            Some(roots) => Arc::clone(roots),
            None => Arc::new(default_root_store()),
        };

        ClientConfig::builder_with_provider(Arc::clone(&self.provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| SecError::TlsError(format!("TLS version config: {}", e)))?
            .with_root_certificates(roots)
            .with_client_auth_cert(self.cert_chain.clone(), self.key.clone_key())
            .map_err(|e| SecError::TlsError(format!("Failed to set client certificate: {}", e)))
    }

    /// Server configuration presenting this identity.
    ///
    /// With custom anchors, clients must present a certificate issued by one
    /// of them (mutual TLS). Without, no client certificate is requested.
    pub fn server_config(&self) -> Result<ServerConfig> {
        let builder = ServerConfig::builder_with_provider(Arc::clone(&self.provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| SecError::TlsError(format!("TLS version config: {}", e)))?;

        let builder = match &self.trust_anchors {
            Some(roots) => {
                let verifier = WebPkiClientVerifier::builder_with_provider(
                    Arc::clone(roots),
                    Arc::clone(&self.provider),
                )
                .build()
                .map_err(|e| {
                    SecError::TlsError(format!("Failed to create client verifier: {}", e))
                })?;
                builder.with_client_cert_verifier(verifier)
            }
            None => builder.with_no_client_auth(),
        };

        builder
            .with_single_cert(self.cert_chain.clone(), self.key.clone_key())
            .map_err(|e| SecError::TlsError(format!("Failed to create server config: {}", e)))
    }
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("fingerprint", &self.fingerprint())
            .field("chain_len", &self.cert_chain.len())
            .field(
                "trust_anchors",
                &self.trust_anchors.as_ref().map(|r| r.len()),
            )
            .field("skipped_trust_anchors", &self.skipped_trust_anchors)
            .finish_non_exhaustive()
    }
}

fn default_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    root_store
}
