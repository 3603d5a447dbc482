//! Cache Registry Module
//!
//! Owns every named cache of a process and runs administrative operations
//! against one cache or, with the name `all`, against each of them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::cache::{
    CacheInstance, CacheOptions, CacheOptionsOverrides, CacheValue, ManagedCache, StatsSnapshot,
};
use crate::error::{CacheError, Result};
use crate::scheduler::Scheduler;

/// Name that targets every registered cache.
pub const ALL_CACHES: &str = "all";

// == Fanout ==
/// Result of an administrative operation.
///
/// Serializes as the bare result for a single cache and as a name keyed
/// object for `all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Fanout<T> {
    Single(T),
    All(BTreeMap<String, T>),
}

impl<T> Fanout<T> {
    /// The single result, if the operation targeted one cache.
    pub fn single(self) -> Option<T> {
        match self {
            Fanout::Single(value) => Some(value),
            Fanout::All(_) => None,
        }
    }
}

// == Cache Registry ==
/// Name to cache mapping with unique names.
///
/// Caches are never removed once registered.
pub struct CacheRegistry {
    caches: RwLock<HashMap<String, Arc<dyn ManagedCache>>>,
    scheduler: Scheduler,
}

impl CacheRegistry {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            scheduler,
        }
    }

    /// An empty registry scheduling on the caller's tokio runtime.
    pub fn with_current_runtime() -> Result<Self> {
        Scheduler::current().map(Self::new)
    }

    // == Register ==
    /// Creates the cache `name` from the defaults merged with `overrides`.
    ///
    /// Fails with `NameConflict` if the name is taken. A failed registration
    /// leaves the registry untouched.
    pub fn register<V>(
        &self,
        name: impl Into<String>,
        overrides: &CacheOptionsOverrides,
    ) -> Result<Arc<CacheInstance<V>>>
    where
        V: CacheValue + Send + Sync + 'static,
    {
        let name = name.into();
        if name.is_empty() || name == ALL_CACHES {
            return Err(CacheError::InvalidArgument(format!(
                "cache name must be non-empty and not `{ALL_CACHES}`"
            )));
        }

        let mut caches = self.caches.write();
        if caches.contains_key(&name) {
            return Err(CacheError::NameConflict(name));
        }

        let options = CacheOptions::from_overrides(overrides);
        let instance = Arc::new(CacheInstance::<V>::new(
            name.clone(),
            options,
            self.scheduler.clone(),
        )?);
        caches.insert(name.clone(), Arc::clone(&instance) as Arc<dyn ManagedCache>);

        info!(cache = %name, "registered cache");
        Ok(instance)
    }

    // == Lookup ==
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ManagedCache>> {
        self.caches.read().get(name).cloned()
    }

    /// Typed lookup. `None` if the name is unknown or holds another value type.
    pub fn get<V>(&self, name: &str) -> Option<Arc<CacheInstance<V>>>
    where
        V: CacheValue + Send + Sync + 'static,
    {
        self.lookup(name)?.as_any().downcast::<CacheInstance<V>>().ok()
    }

    /// Every cache, sorted by name.
    pub fn enumerate(&self) -> Vec<(String, Arc<dyn ManagedCache>)> {
        let mut caches: Vec<_> = self
            .caches
            .read()
            .iter()
            .map(|(name, cache)| (name.clone(), Arc::clone(cache)))
            .collect();
        caches.sort_by(|a, b| a.0.cmp(&b.0));
        caches
    }

    pub fn names(&self) -> Vec<String> {
        self.enumerate().into_iter().map(|(name, _)| name).collect()
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    /// Stops the periodic tasks of every cache.
    pub fn shutdown_all(&self) {
        for (_, cache) in self.enumerate() {
            cache.shutdown();
        }
        info!("all caches shut down");
    }

    // == Administration ==
    /// Prunes stale entries of `name`, or of every cache for `all`.
    pub fn purge_stale(&self, name: &str) -> Result<()> {
        self.fan_out(name, |cache| {
            cache.prune();
        })
        .map(drop)
    }

    pub fn clear_cache(&self, name: &str) -> Result<()> {
        self.fan_out(name, |cache| cache.clear_cache()).map(drop)
    }

    pub fn get_options(&self, name: &str) -> Result<Fanout<CacheOptions>> {
        self.fan_out(name, |cache| cache.options().clone())
    }

    pub fn get_stats(&self, name: &str) -> Result<Fanout<StatsSnapshot>> {
        self.fan_out(name, |cache| cache.get_stats())
    }

    pub fn reset_stats(&self, name: &str) -> Result<()> {
        self.fan_out(name, |cache| cache.reset_stats()).map(drop)
    }

    /// Runs `op` outside the registry lock.
    fn fan_out<T>(&self, name: &str, op: impl Fn(&dyn ManagedCache) -> T) -> Result<Fanout<T>> {
        if name == ALL_CACHES {
            let results = self
                .enumerate()
                .into_iter()
                .map(|(name, cache)| (name, op(cache.as_ref())))
                .collect();
            return Ok(Fanout::All(results));
        }

        let cache = self
            .lookup(name)
            .ok_or_else(|| CacheError::NotFound(name.to_string()))?;
        Ok(Fanout::Single(op(cache.as_ref())))
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("names", &self.names())
            .finish_non_exhaustive()
    }
}
