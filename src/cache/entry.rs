//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached value together with its insertion time and lifetime.
///
/// Entries are never mutated after insertion; a new `set` on the same key
/// replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Monotonic insertion timestamp
    pub inserted_at: Instant,
    /// Lifetime measured from `inserted_at`
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current instant.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self::with_timestamp(value, ttl, Instant::now())
    }

    /// Creates an entry with an explicit insertion instant.
    pub fn with_timestamp(value: V, ttl: Duration, inserted_at: Instant) -> Self {
        Self {
            value,
            inserted_at,
            ttl,
        }
    }

    // == Age ==
    /// Time elapsed between insertion and `now`.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    /// Time elapsed since insertion.
    pub fn age(&self) -> Duration {
        self.age_at(Instant::now())
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now`.
    ///
    /// Boundary condition: an entry whose age equals its TTL is still valid.
    /// It only expires once the age strictly exceeds the TTL.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.age_at(now) > self.ttl
    }

    /// Checks whether the entry is stale right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Remaining lifetime, saturating at zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.ttl.saturating_sub(self.age())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("test_value", Duration::from_secs(60));

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.ttl, Duration::from_secs(60));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(42u32, Duration::from_millis(10));

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(20));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::with_timestamp("test", Duration::from_secs(5), now);

        // Age equal to the TTL is still fresh
        assert!(!entry.is_expired_at(now + Duration::from_secs(5)));
        assert!(entry.is_expired_at(now + Duration::from_secs(5) + Duration::from_nanos(1)));
    }

    #[test]
    fn test_zero_ttl_expires_after_any_delay() {
        let now = Instant::now();
        let entry = CacheEntry::with_timestamp((), Duration::ZERO, now);

        assert!(!entry.is_expired_at(now));
        assert!(entry.is_expired_at(now + Duration::from_millis(1)));
    }

    #[test]
    fn test_age_is_measured_from_insertion() {
        let now = Instant::now();
        let entry = CacheEntry::with_timestamp("v", Duration::from_secs(60), now);

        assert_eq!(entry.age_at(now + Duration::from_millis(1500)), Duration::from_millis(1500));
        assert_eq!(entry.age_at(now), Duration::ZERO);
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("v", Duration::from_secs(10));

        let remaining = entry.ttl_remaining();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }

    #[test]
    fn test_ttl_remaining_expired() {
        let entry = CacheEntry::new("v", Duration::from_millis(5));

        sleep(Duration::from_millis(15));

        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }
}
