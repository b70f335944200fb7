//! PEM parsing for certificates, keys and CA bundles

use std::io::BufReader;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::RootCertStore;

use crate::error::{Result, SecError};

/// Trust anchors collected from a CA bundle.
#[derive(Debug, Clone)]
pub struct TrustAnchors {
    /// Anchors that parsed
    pub store: RootCertStore,
    /// Entries skipped because they could not be decoded or parsed
    pub skipped: usize,
}

/// Load a certificate chain (leaf first) from PEM data.
///
/// Blocks other than `CERTIFICATE` are ignored. Any certificate block that
/// fails to decode fails the whole chain.
pub fn parse_certificate_chain(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = BufReader::new(pem);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| SecError::MalformedCertificate(format!("Failed to decode PEM: {}", e)))?;

    if certs.is_empty() {
        return Err(SecError::MalformedCertificate(
            "No certificates found in PEM".to_string(),
        ));
    }

    Ok(certs)
}

/// Load the first private key (PKCS#8, PKCS#1 or SEC1) from PEM data.
pub fn parse_private_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>> {
    let mut reader = BufReader::new(pem);
    let key = rustls_pemfile::private_key(&mut reader)
        .map_err(|e| SecError::MalformedKey(format!("Failed to parse key: {}", e)))?
        .ok_or_else(|| SecError::MalformedKey("No private key found in PEM".to_string()))?;

    Ok(key)
}

/// Collect trust anchors from a CA bundle, skipping entries that do not parse.
pub fn parse_trust_anchors(pem: &[u8]) -> TrustAnchors {
    let mut store = RootCertStore::empty();
    let mut skipped = 0;
    let mut reader = BufReader::new(pem);

    for (index, item) in rustls_pemfile::certs(&mut reader).enumerate() {
        let added = match item {
            Ok(der) => store.add(der).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        if let Err(error) = added {
            tracing::warn!(index, %error, "Skipping malformed trust anchor entry");
            skipped += 1;
        }
    }

    if store.is_empty() {
        tracing::warn!(
            skipped,
            "CA bundle yielded no usable trust anchors; no peer will be trusted"
        );
    }

    TrustAnchors { store, skipped }
}
