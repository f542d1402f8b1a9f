//! Single-slot TTL cache for query responses
//!
//! The cache holds at most one entry: a key, the cached value and the
//! instant at which it expires. Reads of an expired entry behave like a
//! miss and drop the entry.
//!
//! Every `delete` advances a generation counter. A caller that computes a
//! value after a miss takes the generation first and stores the value with
//! [`ResponseCache::set_if_current`], so a value computed before an
//! invalidation is never stored after it.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::trace;

/// Default time-to-live of a cached response
pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

#[derive(Debug)]
struct CacheEntry<V> {
    key: String,
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct Slot<V> {
    entry: Option<CacheEntry<V>>,
    generation: u64,
}

/// Shared single-entry cache
#[derive(Debug)]
pub struct ResponseCache<V> {
    ttl: Duration,
    slot: Mutex<Slot<V>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(Slot {
                entry: None,
                generation: 0,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of invalidations so far
    pub async fn generation(&self) -> u64 {
        self.slot.lock().await.generation
    }

    /// Cached value for `key`, if present and not expired
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut slot = self.slot.lock().await;
        let entry = slot.entry.as_ref().filter(|entry| entry.key == key)?;
        if entry.expires_at > Instant::now() {
            return Some(entry.value.clone());
        }

        trace!("cache entry '{key}' expired");
        slot.entry = None;
        None
    }

    /// Store `value` under `key`, replacing whatever the slot held
    pub async fn set(&self, key: &str, value: V) {
        let mut slot = self.slot.lock().await;
        slot.entry = Some(self.entry(key, value));
    }

    /// Store `value` only if no `delete` happened since `generation` was read.
    ///
    /// Returns whether the value was stored.
    pub async fn set_if_current(&self, key: &str, value: V, generation: u64) -> bool {
        let mut slot = self.slot.lock().await;
        if slot.generation != generation {
            trace!("discarding value for '{key}' computed before invalidation");
            return false;
        }
        slot.entry = Some(self.entry(key, value));
        true
    }

    /// Drop the entry if it is stored under `key` and invalidate values
    /// still being computed
    pub async fn delete(&self, key: &str) {
        let mut slot = self.slot.lock().await;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.entry.as_ref().is_some_and(|entry| entry.key == key) {
            slot.entry = None;
        }
    }

    fn entry(&self, key: &str, value: V) -> CacheEntry<V> {
        CacheEntry {
            key: key.to_string(),
            value,
            expires_at: Instant::now() + self.ttl,
        }
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
