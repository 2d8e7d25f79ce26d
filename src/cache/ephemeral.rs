use super::Clock;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Key → value map whose entries expire lazily on read.
pub struct EphemeralCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> EphemeralCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Return the value stored under `key` unless it has expired.
    ///
    /// An expired entry is removed as a side effect.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();

        match self.entries.get(key) {
            Some(entry) if now <= entry.expires_at => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }

        // The read guard must be released before removing.
        if self
            .entries
            .remove_if(key, |_, entry| now > entry.expires_at)
            .is_some()
        {
            log::debug!("cache entry expired: {}", key);
        }
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Number of stored entries, including ones that expired but were not read yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
