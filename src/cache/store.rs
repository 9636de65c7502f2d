//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and lazy
//! TTL expiration. The store is single-owner (`&mut self`); see
//! [`SharedCache`](crate::cache::SharedCache) for the concurrent handle.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Cache Hit ==
/// A live value returned by a lookup, with the time since it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit<V> {
    pub value: V,
    pub age: Duration,
}

// == Cache Store ==
/// Bounded key-value storage with LRU eviction and per-entry TTL.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one so that a value just stored can
    /// always be read back.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            lru: LruTracker::new(),
            stats: CacheStats::new(capacity),
            capacity,
        }
    }

    // == Set ==
    /// Stores a value under `key` for `ttl`, marking it most recently used.
    ///
    /// Overwriting an existing key replaces the entry and never evicts. A new
    /// key on a full store first evicts the least recently used entry, so the
    /// store never holds more than `capacity` entries.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!(key = %evicted, "evicted least recently used entry");
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, ttl));
        self.stats.set_size(self.entries.len());
    }

    // == Clear ==
    /// Drops every entry and zeroes the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.reset();
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_size(self.entries.len());
        stats
    }

    /// Checks for a key without touching it, counting it or checking expiry.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lru.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<V: Clone> CacheStore<V> {
    // == Get ==
    /// Looks up a live value.
    ///
    /// A stale entry is removed by the lookup that finds it and reported as
    /// a miss. A hit moves the key to the most recently used position.
    pub fn get(&mut self, key: &str) -> Option<CacheHit<V>> {
        self.lookup(key, true)
    }

    /// Same as [`get`](Self::get) without touching the hit/miss counters.
    /// Used to re-check a key a caller has already counted a miss for.
    pub(crate) fn get_uncounted(&mut self, key: &str) -> Option<CacheHit<V>> {
        self.lookup(key, false)
    }

    fn lookup(&mut self, key: &str, count: bool) -> Option<CacheHit<V>> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(key) else {
            if count {
                self.stats.record_miss();
            }
            return None;
        };

        if entry.is_expired_at(now) {
            let age = entry.age_at(now);
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expiration();
            self.stats.set_size(self.entries.len());
            if count {
                self.stats.record_miss();
            }
            debug!(key, age_ms = age.as_millis() as u64, "removed expired entry");
            return None;
        }

        let hit = CacheHit {
            value: entry.value.clone(),
            age: entry.age_at(now),
        };
        self.lru.touch(key);
        if count {
            self.stats.record_hit();
        }
        Some(hit)
    }
}
