//! Random token generation
//!
//! Nonces are hex-encoded bytes drawn from an [`EntropySource`]. Production
//! code uses [`OsEntropy`]; tests inject [`SequenceEntropy`] (or their own
//! source) through [`crate::providers`] without touching call sites.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Result, SecError};

/// A source of random bytes for nonces.
pub trait EntropySource: Send + Sync + fmt::Debug {
    /// Fill `buf` entirely, or fail without partial success being observable.
    fn try_fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn try_fill(&self, buf: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(buf)?;
        Ok(())
    }
}

/// Deterministic source emitting an incrementing byte counter.
///
/// Successive fills continue where the previous one stopped, so two nonces
/// drawn from the same instance differ.
#[derive(Debug, Default)]
pub struct SequenceEntropy {
    next: Mutex<u8>,
}

impl SequenceEntropy {
    pub fn new(start: u8) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }
}

impl EntropySource for SequenceEntropy {
    fn try_fill(&self, buf: &mut [u8]) -> Result<()> {
        let mut next = self.next.lock();
        for byte in buf.iter_mut() {
            *byte = *next;
            *next = next.wrapping_add(1);
        }
        Ok(())
    }
}

/// Produces hex nonces from an injected entropy source.
#[derive(Debug, Clone)]
pub struct NonceGenerator {
    source: Arc<dyn EntropySource>,
}

impl NonceGenerator {
    pub fn new(source: Arc<dyn EntropySource>) -> Self {
        Self { source }
    }

    /// Generator backed by the operating system CSPRNG.
    pub fn os() -> Self {
        Self::new(Arc::new(OsEntropy))
    }

    /// Return `2 * n` lowercase hex characters encoding `n` random bytes.
    pub fn try_nonce_str(&self, n: usize) -> Result<String> {
        if n == 0 {
            return Ok(String::new());
        }

        let mut buf = vec![0u8; n];
        self.source.try_fill(&mut buf)?;
        Ok(hex::encode(buf))
    }

    /// Like [`try_nonce_str`](Self::try_nonce_str), but an entropy failure
    /// panics. There is no retry and no weaker fallback.
    pub fn nonce_str(&self, n: usize) -> String {
        match self.try_nonce_str(n) {
            Ok(nonce) => nonce,
            Err(e) => {
                tracing::error!(error = %e, "secure random source unavailable");
                panic!("nonce generation failed: {e}");
            }
        }
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::os()
    }
}

/// Nonce of `2 * n` hex characters from the process-wide default source.
///
/// Panics if the entropy source fails.
pub fn nonce_str(n: usize) -> String {
    crate::providers::current().nonce_str(n)
}

/// Fallible variant of [`nonce_str`].
pub fn try_nonce_str(n: usize) -> Result<String> {
    crate::providers::current().nonce_generator().try_nonce_str(n)
}

/// Entropy source that always fails. Used to exercise the fatal path.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableEntropy;

impl EntropySource for UnavailableEntropy {
    fn try_fill(&self, _buf: &mut [u8]) -> Result<()> {
        Err(SecError::EntropySource("entropy device unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_length_and_charset() {
        let gen = NonceGenerator::os();
        for n in [0usize, 1, 7, 16, 32, 255] {
            let nonce = gen.nonce_str(n);
            assert_eq!(nonce.len(), 2 * n);
            assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_zero_length_skips_source() {
        let gen = NonceGenerator::new(Arc::new(UnavailableEntropy));
        assert_eq!(gen.try_nonce_str(0).unwrap(), "");
    }

    #[test]
    fn test_no_collisions() {
        let gen = NonceGenerator::os();
        let seen: HashSet<String> = (0..1000).map(|_| gen.nonce_str(16)).collect();
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_sequence_source_is_deterministic() {
        let gen = NonceGenerator::new(Arc::new(SequenceEntropy::new(0)));
        assert_eq!(gen.nonce_str(4), "00010203");
        assert_eq!(gen.nonce_str(2), "0405");

        let wrap = NonceGenerator::new(Arc::new(SequenceEntropy::new(0xfe)));
        assert_eq!(wrap.nonce_str(3), "feff00");
    }

    #[test]
    fn test_failure_is_reported() {
        let gen = NonceGenerator::new(Arc::new(UnavailableEntropy));
        let err = gen.try_nonce_str(8).unwrap_err();
        assert!(matches!(err, SecError::EntropySource(_)));
    }

    #[test]
    #[should_panic(expected = "nonce generation failed")]
    fn test_failure_is_fatal() {
        let gen = NonceGenerator::new(Arc::new(UnavailableEntropy));
        gen.nonce_str(8);
    }
}
