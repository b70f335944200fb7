//! Injectable clock and entropy
//!
//! Components that need time or randomness take a [`Providers`] value. For
//! call sites that cannot thread one through, a process-wide default exists
//! with an explicit lifecycle:
//!
//! ```
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use secutil::clock::FixedClock;
//! use secutil::nonce::SequenceEntropy;
//! use secutil::providers::{self, Providers};
//!
//! let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
//! let guard = providers::install(Providers::new(
//!     Arc::new(FixedClock(t)),
//!     Arc::new(SequenceEntropy::new(0)),
//! ));
//! assert_eq!(secutil::clock::now(), t);
//! assert_eq!(secutil::nonce::nonce_str(2), "0001");
//! drop(guard); // previous default restored
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{const_rwlock, RwLock};

use crate::clock::{Clock, SystemClock};
use crate::nonce::{EntropySource, NonceGenerator, OsEntropy};

/// Installed overrides, most recent last. Empty means the system default.
static INSTALLED: RwLock<Vec<Installed>> = const_rwlock(Vec::new());

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct Installed {
    id: u64,
    providers: Providers,
}

/// A clock and an entropy source, passed to whatever needs them.
#[derive(Debug, Clone)]
pub struct Providers {
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
}

impl Providers {
    pub fn new(clock: Arc<dyn Clock>, entropy: Arc<dyn EntropySource>) -> Self {
        Self { clock, entropy }
    }

    /// Host clock and operating system CSPRNG.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(OsEntropy))
    }

    /// Replace the clock, keeping the entropy source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the entropy source, keeping the clock.
    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn entropy(&self) -> &Arc<dyn EntropySource> {
        &self.entropy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn nonce_generator(&self) -> NonceGenerator {
        NonceGenerator::new(Arc::clone(&self.entropy))
    }

    /// Panics if the entropy source fails.
    pub fn nonce_str(&self, n: usize) -> String {
        self.nonce_generator().nonce_str(n)
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::system()
    }
}

/// The process-wide default providers.
pub fn current() -> Providers {
    INSTALLED
        .read()
        .last()
        .map(|entry| entry.providers.clone())
        .unwrap_or_else(Providers::system)
}

/// Install `providers` as the process-wide default until the returned guard
/// is dropped.
///
/// The most recently installed providers that are still live win. Dropping a
/// guard removes only its own entry, whatever the order.
#[must_use = "the providers are uninstalled when the guard is dropped"]
pub fn install(providers: Providers) -> ProvidersGuard {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    INSTALLED.write().push(Installed { id, providers });
    tracing::debug!(id, "process default providers overridden");
    ProvidersGuard { id }
}

/// Drop every override and go back to the system clock and OS entropy.
///
/// Guards still alive afterwards uninstall nothing.
pub fn reset() {
    INSTALLED.write().clear();
}

/// Uninstalls its providers on drop.
#[derive(Debug)]
pub struct ProvidersGuard {
    id: u64,
}

impl Drop for ProvidersGuard {
    fn drop(&mut self) {
        let mut installed = INSTALLED.write();
        if let Some(pos) = installed.iter().rposition(|entry| entry.id == self.id) {
            installed.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::nonce::SequenceEntropy;
    use chrono::TimeZone;

    #[test]
    fn test_injected_providers() {
        let t = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        let p = Providers::system()
            .with_clock(Arc::new(FixedClock(t)))
            .with_entropy(Arc::new(SequenceEntropy::new(0xa0)));

        assert_eq!(p.now(), t);
        assert_eq!(p.nonce_str(3), "a0a1a2");
        // Clones share the same source.
        assert_eq!(p.clone().nonce_str(1), "a3");
    }

    // Serializes the tests below; they share the process default.
    static GLOBAL: parking_lot::Mutex<()> = parking_lot::const_mutex(());

    fn fixed(year: i32) -> (DateTime<Utc>, Providers) {
        let t = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
        (t, Providers::system().with_clock(Arc::new(FixedClock(t))))
    }

    #[test]
    fn test_install_and_restore() {
        let _lock = GLOBAL.lock();
        let (t1, p1) = fixed(2025);
        let (t2, p2) = fixed(2026);

        let outer = install(p1);
        assert_eq!(crate::clock::now(), t1);

        {
            let _inner = install(p2);
            assert_eq!(crate::clock::now(), t2);
        }
        assert_eq!(crate::clock::now(), t1);

        drop(outer);
        assert_ne!(crate::clock::now(), t1);
    }

    #[test]
    fn test_guards_dropped_out_of_order() {
        let _lock = GLOBAL.lock();
        let (t1, p1) = fixed(2001);
        let (t2, p2) = fixed(2002);

        let outer = install(p1);
        let inner = install(p2);

        drop(outer);
        assert_eq!(crate::clock::now(), t2);

        drop(inner);
        let now = crate::clock::now();
        assert_ne!(now, t1);
        assert_ne!(now, t2);
    }

    #[test]
    fn test_reset_survives_later_drops() {
        let _lock = GLOBAL.lock();
        let (t1, p1) = fixed(2001);
        let (t2, p2) = fixed(2002);

        let a = install(p1);
        let b = install(p2);
        reset();
        assert_ne!(crate::clock::now(), t2);

        drop(b);
        assert_ne!(crate::clock::now(), t1);
        drop(a);
        assert_ne!(crate::clock::now(), t1);

        // Installing after a reset works as usual.
        let (t3, p3) = fixed(2003);
        let _c = install(p3);
        assert_eq!(crate::clock::now(), t3);
    }
}
