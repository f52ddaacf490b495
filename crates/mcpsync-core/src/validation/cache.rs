//! Time-bounded cache of validation results
//!
//! Entries are keyed by `(server name, config fingerprint)` so an edited
//! configuration never hits a stale entry. Age is measured with an injectable
//! [`Clock`] so TTL behaviour can be tested without sleeping.

use super::result::ValidationResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default time-to-live for cached results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.base + offset
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    server: String,
    fingerprint: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    result: ValidationResult,
}

/// Thread-safe validation cache owned by a validation engine.
pub struct ValidationCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ValidationCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a result younger than the TTL. Expired entries are evicted.
    pub fn get(&self, server: &str, fingerprint: &str) -> Option<ValidationResult> {
        let key = CacheKey {
            server: server.to_string(),
            fingerprint: fingerprint.to_string(),
        };
        let now = self.clock.now();
        let mut entries = self.lock();

        let fresh = match entries.get(&key) {
            Some(entry) => now.saturating_duration_since(entry.stored_at) < self.ttl,
            None => return None,
        };
        if fresh {
            entries.get(&key).map(|entry| entry.result.clone())
        } else {
            entries.remove(&key);
            tracing::debug!(server, "Evicted expired validation result");
            None
        }
    }

    pub fn insert(&self, server: &str, fingerprint: &str, result: ValidationResult) {
        let entry = CacheEntry {
            stored_at: self.clock.now(),
            result,
        };
        self.lock().insert(
            CacheKey {
                server: server.to_string(),
                fingerprint: fingerprint.to_string(),
            },
            entry,
        );
    }

    /// Drop every cached result for `server`, whatever its fingerprint.
    pub fn remove_server(&self, server: &str) {
        self.lock().retain(|key, _| key.server != server);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ValidationCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl std::fmt::Debug for ValidationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}
