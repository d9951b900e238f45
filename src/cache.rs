//! Process-scoped single-value TTL cache
//!
//! Readers share a lock; a refresh replaces the whole entry at once. Uses
//! `tokio::time::Instant` so tests can drive expiry with a paused clock.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Cached value if it is younger than the TTL
    #[must_use]
    pub fn get(&self) -> Option<T> {
        let guard = self.entry.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Replace the entry, stamping it with the current time
    pub fn refresh(&self, value: T) {
        let mut guard = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Entry {
            value,
            fetched_at: Instant::now(),
        });
    }

    pub fn clear(&self) {
        let mut guard = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}
