//! Cache Instance Module
//!
//! A named cache: one eviction store, its stats, and two independently
//! scheduled maintenance tasks (clearing and pruning).

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Instant;

use anyhow::anyhow;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{
    CacheOptions, CacheValue, EvictionStore, GetOptions, PutOptions, StatsSnapshot, StatsTracker,
};
use crate::error::Result;
use crate::scheduler::{CronSchedule, ScheduleHandle, Scheduler};

/// Store slots visited per lock acquisition while pruning.
pub const PRUNE_BATCH_SIZE: usize = 1_000;

// == Managed Cache ==
/// Value-type independent view of a cache, used for administration.
pub trait ManagedCache: Send + Sync {
    fn name(&self) -> &str;
    fn options(&self) -> &CacheOptions;
    /// Removes stale entries, returning how many were removed.
    fn prune(&self) -> usize;
    fn clear_cache(&self);
    fn get_stats(&self) -> StatsSnapshot;
    fn reset_stats(&self);
    /// Stops both periodic tasks.
    fn shutdown(&self);
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

// == Maintenance Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Maintenance {
    Clearing,
    Pruning,
}

impl fmt::Display for Maintenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Maintenance::Clearing => f.write_str("clearing"),
            Maintenance::Pruning => f.write_str("pruning"),
        }
    }
}

// == Cache Core ==
/// State shared with scheduled tasks, which only hold a weak reference.
struct CacheCore<V> {
    name: String,
    store: Mutex<EvictionStore<V>>,
    stats: StatsTracker,
}

impl<V: CacheValue> CacheCore<V> {
    fn prune(&self) -> usize {
        info!(cache = %self.name, "start cache pruning of stale entries");

        let now = Instant::now();
        let mut cursor = 0;
        let mut removed = 0;
        loop {
            // Lock per batch so readers and writers get in between
            let progress = self
                .store
                .lock()
                .purge_stale_batch(cursor, PRUNE_BATCH_SIZE, now);
            removed += progress.removed;
            match progress.next {
                Some(next) => {
                    cursor = next;
                    std::thread::yield_now();
                }
                None => break,
            }
        }

        info!(cache = %self.name, removed, "end cache pruning of stale entries");
        removed
    }

    fn clear(&self) {
        info!(cache = %self.name, "clear cache");
        self.store.lock().clear();
    }

    fn run(&self, maintenance: Maintenance) {
        debug!(cache = %self.name, "periodic cache {}", maintenance);
        match maintenance {
            Maintenance::Clearing => self.clear(),
            Maintenance::Pruning => {
                self.prune();
            }
        }
    }
}

// == Cache Instance ==
/// A named, independently configured cache.
///
/// Created through [`crate::cache::CacheRegistry::register`].
pub struct CacheInstance<V> {
    core: Arc<CacheCore<V>>,
    options: CacheOptions,
    clearing_schedule: CronSchedule,
    pruning_schedule: CronSchedule,
    scheduler: Scheduler,
    /// Present while periodic clearing is scheduled
    clearing: Mutex<Option<ScheduleHandle>>,
    /// Present while periodic pruning is scheduled
    pruning: Mutex<Option<ScheduleHandle>>,
}

impl<V> CacheInstance<V>
where
    V: CacheValue + Send + Sync + 'static,
{
    // == Constructor ==
    /// Builds the cache and starts the periodic tasks flagged `autoStart`.
    pub(crate) fn new(name: String, options: CacheOptions, scheduler: Scheduler) -> Result<Self> {
        options.validate()?;
        let clearing_schedule = CronSchedule::parse(&options.periodic_clearing.schedule)?;
        let pruning_schedule = CronSchedule::parse(&options.periodic_pruning.schedule)?;

        let native = &options.native_cache_options;
        let store = EvictionStore::new(native.max, native.ttl_duration())
            .with_update_age_on_get(native.update_age_on_get);

        let instance = Self {
            core: Arc::new(CacheCore {
                name,
                store: Mutex::new(store),
                stats: StatsTracker::new(),
            }),
            options,
            clearing_schedule,
            pruning_schedule,
            scheduler,
            clearing: Mutex::new(None),
            pruning: Mutex::new(None),
        };

        if instance.options.periodic_clearing.auto_start {
            instance.start_periodic(Maintenance::Clearing, None)?;
        }
        if instance.options.periodic_pruning.auto_start {
            instance.start_periodic(Maintenance::Pruning, None)?;
        }
        Ok(instance)
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    // == Put ==
    /// Stores a value, evicting the least recently used entry when full.
    pub fn put(&self, key: impl Into<String>, value: V, options: PutOptions) -> Result<()> {
        self.core.store.lock().put(key.into(), value, options.ttl)
    }

    // == Get ==
    /// Reads a value and counts the read as a hit or a miss.
    pub fn get(&self, key: &str, options: GetOptions) -> Result<Option<V>> {
        let value = self.core.store.lock().get(key, options)?;
        match value {
            Some(_) => self.core.stats.record_hit(),
            None => self.core.stats.record_miss(),
        }
        Ok(value)
    }

    // == Remove ==
    pub fn remove(&self, key: &str) -> Result<Option<V>> {
        self.core.store.lock().remove(key)
    }

    // == Prune ==
    /// Removes stale entries in batches, releasing the store between batches.
    pub fn prune(&self) -> usize {
        self.core.prune()
    }

    // == Clear ==
    pub fn clear_cache(&self) {
        self.core.clear();
    }

    // == Stats ==
    pub fn get_stats(&self) -> StatsSnapshot {
        let entry_count = self.core.store.lock().len();
        self.core.stats.snapshot(
            entry_count,
            self.clearing.lock().is_some(),
            self.pruning.lock().is_some(),
        )
    }

    /// Zeroes hits and misses. The entry count is unaffected.
    pub fn reset_stats(&self) {
        debug!(
            cache = %self.name(),
            hit_rate = self.core.stats.hit_rate(),
            "reset cache stats"
        );
        self.core.stats.reset();
    }

    // == Periodic Clearing ==
    /// Schedules `clear_cache` on `schedule`, or on the configured clearing
    /// schedule.
    ///
    /// Does nothing if clearing is already scheduled.
    pub fn start_periodic_clearing(&self, schedule: Option<&str>) -> Result<()> {
        self.start_periodic(Maintenance::Clearing, schedule)
    }

    pub fn stop_periodic_clearing(&self) {
        self.stop_periodic(Maintenance::Clearing);
    }

    // == Periodic Pruning ==
    /// Schedules `prune` on `schedule`, or on the configured pruning
    /// schedule.
    ///
    /// Does nothing if pruning is already scheduled.
    pub fn start_periodic_pruning(&self, schedule: Option<&str>) -> Result<()> {
        self.start_periodic(Maintenance::Pruning, schedule)
    }

    pub fn stop_periodic_pruning(&self) {
        self.stop_periodic(Maintenance::Pruning);
    }

    // == Shutdown ==
    /// Stops both periodic tasks. Runs already in progress complete.
    pub fn shutdown(&self) {
        self.stop_periodic_clearing();
        self.stop_periodic_pruning();
    }

    fn handle_slot(&self, maintenance: Maintenance) -> &Mutex<Option<ScheduleHandle>> {
        match maintenance {
            Maintenance::Clearing => &self.clearing,
            Maintenance::Pruning => &self.pruning,
        }
    }

    fn start_periodic(&self, maintenance: Maintenance, schedule: Option<&str>) -> Result<()> {
        let mut slot = self.handle_slot(maintenance).lock();
        if slot.is_some() {
            info!(cache = %self.name(), "periodic {} already running", maintenance);
            return Ok(());
        }

        let schedule = match schedule {
            Some(expression) => CronSchedule::parse(expression)?,
            None => match maintenance {
                Maintenance::Clearing => self.clearing_schedule.clone(),
                Maintenance::Pruning => self.pruning_schedule.clone(),
            },
        };

        let core: Weak<CacheCore<V>> = Arc::downgrade(&self.core);
        let label = format!("{}:{}", self.name(), maintenance);
        info!(
            cache = %self.name(),
            schedule = %schedule,
            "initialized periodic cache {}", maintenance
        );
        *slot = Some(self.scheduler.schedule(label, schedule, move || {
            let core = core
                .upgrade()
                .ok_or_else(|| anyhow!("cache dropped before periodic {}", maintenance))?;
            core.run(maintenance);
            Ok(())
        }));
        Ok(())
    }

    fn stop_periodic(&self, maintenance: Maintenance) {
        if let Some(handle) = self.handle_slot(maintenance).lock().take() {
            info!(cache = %self.name(), "stopping periodic {}", maintenance);
            handle.cancel();
        }
    }
}

impl<V> ManagedCache for CacheInstance<V>
where
    V: CacheValue + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        CacheInstance::name(self)
    }

    fn options(&self) -> &CacheOptions {
        CacheInstance::options(self)
    }

    fn prune(&self) -> usize {
        CacheInstance::prune(self)
    }

    fn clear_cache(&self) {
        CacheInstance::clear_cache(self)
    }

    fn get_stats(&self) -> StatsSnapshot {
        CacheInstance::get_stats(self)
    }

    fn reset_stats(&self) {
        CacheInstance::reset_stats(self)
    }

    fn shutdown(&self) {
        CacheInstance::shutdown(self)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<V> fmt::Debug for CacheInstance<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheInstance")
            .field("name", &self.core.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
