//! Named Cache - named in-memory caches with scheduled maintenance
//!
//! Capacity-bounded LRU caches with per-entry TTL and hit/miss stats,
//! cleared and pruned on cron schedules, owned by a registry and managed
//! through an HTTP admin API.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod scheduler;

pub use api::AppState;
pub use cache::{CacheInstance, CacheRegistry};
pub use config::Config;
pub use error::{CacheError, Result};
