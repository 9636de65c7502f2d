//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction, plus the
//! deterministic key derivation used by tool calls.

mod entry;
pub mod key;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::{build_key, KeyBuilder};
pub use lru::LruTracker;
pub use shared::{CacheLookup, SharedCache};
pub use stats::CacheStats;
pub use store::{CacheHit, CacheStore};

// == Public Constants ==
/// Default maximum number of cached datasets
pub const DEFAULT_CAPACITY: usize = 100;
