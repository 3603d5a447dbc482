//! Cache Statistics Module
//!
//! Tracks hit/miss counters for one cache instance.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// == Stats Tracker ==
/// Hit and miss counters, shared by application reads.
///
/// The entry count is read from the store when a snapshot is taken.
#[derive(Debug, Default)]
pub struct StatsTracker {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Reset ==
    /// Sets hits and misses back to zero.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    // == Snapshot ==
    pub fn snapshot(
        &self,
        entry_count: usize,
        periodic_clearing: bool,
        periodic_pruning: bool,
    ) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            entry_count,
            periodic_clearing,
            periodic_pruning,
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time statistics of one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Reads that returned a value, stale reads included
    pub hits: u64,
    /// Reads that returned nothing
    pub misses: u64,
    /// Entries currently held, stale entries included
    pub entry_count: usize,
    /// Whether scheduled clearing is running
    pub periodic_clearing: bool,
    /// Whether scheduled pruning is running
    pub periodic_pruning: bool,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StatsTracker::new();
        assert_eq!(stats.hits(), 0);
        assert_eq!(stats.misses(), 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = StatsTracker::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = StatsTracker::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_reset_zeroes_counters() {
        let stats = StatsTracker::new();
        stats.record_hit();
        stats.record_miss();

        stats.reset();

        assert_eq!(stats.hits(), 0);
        assert_eq!(stats.misses(), 0);
    }

    #[test]
    fn test_snapshot_carries_live_values() {
        let stats = StatsTracker::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_miss();

        let snapshot = stats.snapshot(7, true, false);

        assert_eq!(
            snapshot,
            StatsSnapshot {
                hits: 1,
                misses: 2,
                entry_count: 7,
                periodic_clearing: true,
                periodic_pruning: false,
            }
        );
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = StatsTracker::new().snapshot(1, false, true);
        let json = serde_json::to_value(snapshot).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "hits": 0,
                "misses": 0,
                "entryCount": 1,
                "periodicClearing": false,
                "periodicPruning": true,
            })
        );
    }
}
