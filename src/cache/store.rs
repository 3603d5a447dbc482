//! Eviction Store Module
//!
//! Capacity-bounded storage combining a key index with LRU ordering and TTL
//! expiration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, CacheValue, LruList};
use crate::error::{CacheError, Result};

// == Per-call Options ==
/// Options accepted by `put`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Overrides the configured TTL for this entry
    pub ttl: Option<Duration>,
}

impl PutOptions {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }
}

/// Options accepted by `get`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Overrides the configured `updateAgeOnGet` for this call
    pub update_age_on_get: Option<bool>,
    /// Return expired entries that have not been pruned yet
    pub allow_stale: bool,
}

impl GetOptions {
    pub fn allow_stale() -> Self {
        Self {
            allow_stale: true,
            ..Self::default()
        }
    }

    pub fn update_age(mut self, update_age_on_get: bool) -> Self {
        self.update_age_on_get = Some(update_age_on_get);
        self
    }
}

/// Outcome of one bounded purge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeProgress {
    /// Entries removed by this step
    pub removed: usize,
    /// Slot to resume from, None once the scan is complete
    pub next: Option<usize>,
}

#[derive(Debug)]
struct Slot<V> {
    key: String,
    entry: CacheEntry<V>,
}

// == Eviction Store ==
/// Key/value storage with LRU eviction and per-entry TTL.
#[derive(Debug)]
pub struct EvictionStore<V> {
    /// Key to slot index in `lru`
    index: HashMap<String, usize>,
    /// Entries in recency order
    lru: LruList<Slot<V>>,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL for entries stored without an override, zero = no expiration
    default_ttl: Duration,
    /// Whether a hit restarts the entry's TTL by default
    update_age_on_get: bool,
}

impl<V: CacheValue> EvictionStore<V> {
    // == Constructor ==
    /// Creates a new store holding at most `max_entries` entries.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            index: HashMap::new(),
            lru: LruList::new(),
            max_entries: max_entries.max(1),
            default_ttl,
            update_age_on_get: false,
        }
    }

    pub fn with_update_age_on_get(mut self, update_age_on_get: bool) -> Self {
        self.update_age_on_get = update_age_on_get;
        self
    }

    // == Put ==
    /// Stores a key-value pair.
    ///
    /// An existing key is overwritten and becomes most recently used with a
    /// fresh TTL. A new key stored at capacity evicts the least recently used
    /// entry first.
    pub fn put(&mut self, key: String, value: V, ttl: Option<Duration>) -> Result<()> {
        validate_key(&key)?;
        if value.is_null() {
            return Err(CacheError::InvalidArgument(
                "Value cannot be null".to_string(),
            ));
        }

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl), Instant::now());

        if let Some(&idx) = self.index.get(&key) {
            if let Some(slot) = self.lru.get_mut(idx) {
                slot.entry = entry;
            }
            self.lru.move_to_front(idx);
            return Ok(());
        }

        if self.index.len() >= self.max_entries {
            if let Some(evicted) = self.lru.pop_back() {
                self.index.remove(&evicted.key);
            }
        }

        let idx = self.lru.push_front(Slot {
            key: key.clone(),
            entry,
        });
        self.index.insert(key, idx);
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are reported absent unless `allow_stale` is set, in
    /// which case the stale value is returned without refreshing it. Reads
    /// never remove entries.
    pub fn get(&mut self, key: &str, options: GetOptions) -> Result<Option<V>> {
        validate_key(key)?;

        let Some(&idx) = self.index.get(key) else {
            return Ok(None);
        };
        let now = Instant::now();
        let update_age = options.update_age_on_get.unwrap_or(self.update_age_on_get);

        let Some(slot) = self.lru.get_mut(idx) else {
            return Ok(None);
        };
        if slot.entry.is_expired_at(now) {
            return Ok(options.allow_stale.then(|| slot.entry.value.clone()));
        }
        if update_age {
            slot.entry.refresh(now);
        }
        let value = slot.entry.value.clone();

        self.lru.move_to_front(idx);
        Ok(Some(value))
    }

    // == Remove ==
    /// Removes an entry, returning its value whether stale or not.
    pub fn remove(&mut self, key: &str) -> Result<Option<V>> {
        validate_key(key)?;
        Ok(self
            .index
            .remove(key)
            .and_then(|idx| self.lru.remove(idx))
            .map(|slot| slot.entry.value))
    }

    // == Purge Stale ==
    /// Removes expired entries among at most `limit` slots starting at
    /// `cursor`.
    ///
    /// Slot indices stay valid between calls, so a caller can release its
    /// lock between steps and resume from `next`.
    pub fn purge_stale_batch(&mut self, cursor: usize, limit: usize, now: Instant) -> PurgeProgress {
        let end = cursor
            .saturating_add(limit.max(1))
            .min(self.lru.slot_count());
        let mut removed = 0;

        for idx in cursor..end {
            let expired = self
                .lru
                .get(idx)
                .is_some_and(|slot| slot.entry.is_expired_at(now));
            if expired {
                if let Some(slot) = self.lru.remove(idx) {
                    self.index.remove(&slot.key);
                    removed += 1;
                }
            }
        }

        PurgeProgress {
            removed,
            next: (end < self.lru.slot_count()).then_some(end),
        }
    }

    /// Removes all expired entries in one pass.
    ///
    /// Returns the number of entries removed.
    pub fn purge_stale(&mut self) -> usize {
        let now = Instant::now();
        let mut cursor = 0;
        let mut removed = 0;
        loop {
            let progress = self.purge_stale_batch(cursor, 1024, now);
            removed += progress.removed;
            match progress.next {
                Some(next) => cursor = next,
                None => return removed,
            }
        }
    }

    // == Clear ==
    /// Removes every entry regardless of expiry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.lru.clear();
    }

    /// Keys from most to least recently used, stale entries included.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lru.iter().map(|slot| slot.key.as_str())
    }

    // == Length ==
    /// Returns the current number of entries, stale entries included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "Key cannot be empty".to_string(),
        ));
    }
    Ok(())
}
