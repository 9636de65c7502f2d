//! Shared Cache Module
//!
//! Cloneable, task-safe handle around a [`CacheStore`]. Every operation holds
//! the store lock only for its own map work; the fetch future passed to
//! [`SharedCache::get_or_set`] always runs with the lock released.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::cache::{CacheHit, CacheStats, CacheStore};

// == Cache Lookup ==
/// Result of a get-or-compute call.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup<V> {
    pub value: V,
    /// Age of the cached value, `None` when it was fetched by this call
    pub age: Option<Duration>,
}

impl<V> CacheLookup<V> {
    fn cached(hit: CacheHit<V>) -> Self {
        Self {
            value: hit.value,
            age: Some(hit.age),
        }
    }

    fn fresh(value: V) -> Self {
        Self { value, age: None }
    }

    pub fn is_fresh(&self) -> bool {
        self.age.is_none()
    }
}

type Gate = Arc<Mutex<()>>;
type GateTable = Arc<SyncMutex<HashMap<String, Gate>>>;

// == Gate Guard ==
/// One caller's claim on a key's gate. Dropping it, on completion or
/// cancellation, removes the gate once no other caller holds it.
struct GateGuard {
    gates: GateTable,
    key: String,
    gate: Gate,
}

impl GateGuard {
    fn acquire(gates: &GateTable, key: &str) -> Self {
        let gate = {
            let mut table = gates.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(key.to_string()).or_default())
        };
        Self {
            gates: Arc::clone(gates),
            key: key.to_string(),
            gate,
        }
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        let mut table = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        // The table and this guard hold the only references: nobody waits
        let idle = table.get(&self.key).is_some_and(|current| {
            Arc::ptr_eq(current, &self.gate) && Arc::strong_count(current) == 2
        });
        if idle {
            table.remove(&self.key);
        }
    }
}

// == Shared Cache ==
/// Process-wide cache handle. Clones share the same store.
#[derive(Debug)]
pub struct SharedCache<V> {
    store: Arc<Mutex<CacheStore<V>>>,
    /// Per-key gates used by `get_or_set_exclusive`
    gates: GateTable,
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gates: Arc::clone(&self.gates),
        }
    }
}

impl<V: Clone> SharedCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self::from_store(CacheStore::new(capacity))
    }

    pub fn from_store(store: CacheStore<V>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            gates: Arc::new(SyncMutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<CacheHit<V>> {
        self.store.lock().await.get(key)
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.store.lock().await.set(key, value, ttl);
    }

    // == Get Or Set ==
    /// Returns the cached value for `key`, or runs `fetch` and caches its
    /// output for `ttl`.
    ///
    /// The read and the write are separate critical sections. Two callers
    /// missing on the same key at once both run `fetch` and the last write
    /// wins. A failed fetch is returned unchanged and nothing is cached.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        fetch: F,
        ttl: Duration,
    ) -> Result<CacheLookup<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key).await {
            trace!(key, "cache hit");
            return Ok(CacheLookup::cached(hit));
        }

        debug!(key, "cache miss, fetching");
        let value = fetch().await?;
        self.set(key, value.clone(), ttl).await;
        Ok(CacheLookup::fresh(value))
    }

    // == Get Or Set (exclusive) ==
    /// Like [`get_or_set`](Self::get_or_set), but at most one fetch per key
    /// runs at a time.
    ///
    /// Callers that miss while another fetch for the same key is running wait
    /// for it and then re-check the store. If that fetch failed, the next
    /// waiter runs its own. A caller cancelled while waiting or fetching
    /// gives up its place without leaving the key gated.
    pub async fn get_or_set_exclusive<F, Fut, E>(
        &self,
        key: &str,
        fetch: F,
        ttl: Duration,
    ) -> Result<CacheLookup<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key).await {
            trace!(key, "cache hit");
            return Ok(CacheLookup::cached(hit));
        }

        let guard = GateGuard::acquire(&self.gates, key);
        let _turn = guard.gate.lock().await;

        let rechecked = self.store.lock().await.get_uncounted(key);
        if let Some(hit) = rechecked {
            trace!(key, "filled by a concurrent fetch");
            return Ok(CacheLookup::cached(hit));
        }

        debug!(key, "cache miss, fetching exclusively");
        let value = fetch().await?;
        self.set(key, value.clone(), ttl).await;
        Ok(CacheLookup::fresh(value))
    }

    /// Number of keys with an exclusive fetch running or queued.
    pub fn pending_fetches(&self) -> usize {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // == Clear ==
    pub async fn clear(&self) {
        self.store.lock().await.clear();
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }
}
