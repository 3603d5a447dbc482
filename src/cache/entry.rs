//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.
//! Expiry is measured on the monotonic clock, so wall-clock adjustments do
//! not stretch or shorten a TTL.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached value and its expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// TTL the entry was stored with, None = no expiration
    pub ttl: Option<Duration>,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` after `now`.
    ///
    /// A zero TTL means the entry never expires.
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        let ttl = (!ttl.is_zero()).then_some(ttl);
        Self {
            value,
            ttl,
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now` reaches its expiration instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires| now >= expires)
    }

    // == Refresh ==
    /// Restarts the entry's TTL from `now`.
    pub fn refresh(&mut self, now: Instant) {
        self.expires_at = self.ttl.and_then(|ttl| now.checked_add(ttl));
    }
}
