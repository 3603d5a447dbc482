//! Cache Module
//!
//! Named in-memory caches with TTL expiration, LRU eviction, hit/miss stats
//! and scheduled maintenance.

mod entry;
mod instance;
mod lru;
mod options;
mod registry;
mod stats;
mod store;
mod value;


// Re-export public types
pub use entry::CacheEntry;
pub use instance::{CacheInstance, ManagedCache, PRUNE_BATCH_SIZE};
pub use lru::LruList;
pub use options::{
    CacheOptions, CacheOptionsOverrides, NativeCacheOptions, NativeCacheOverrides,
    PeriodicTaskOptions, PeriodicTaskOverrides, DEFAULT_CLEARING_SCHEDULE, DEFAULT_MAX_ENTRIES,
    DEFAULT_PRUNING_SCHEDULE, DEFAULT_TTL_MS,
};
pub use registry::{CacheRegistry, Fanout, ALL_CACHES};
pub use stats::{StatsSnapshot, StatsTracker};
pub use store::{EvictionStore, GetOptions, PurgeProgress, PutOptions};
pub use value::CacheValue;
