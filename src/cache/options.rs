//! Cache Options Module
//!
//! Per-cache configuration with documented defaults, and partial overrides
//! merged onto them field by field.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Defaults ==
/// Midnight UTC every day
pub const DEFAULT_CLEARING_SCHEDULE: &str = "0 0 0 * * * *";
/// Start of every hour
pub const DEFAULT_PRUNING_SCHEDULE: &str = "0 0 * * * * *";
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
/// 24 hours
pub const DEFAULT_TTL_MS: u64 = 86_400_000;

// == Cache Options ==
/// Effective configuration of one cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheOptions {
    pub periodic_clearing: PeriodicTaskOptions,
    pub periodic_pruning: PeriodicTaskOptions,
    pub native_cache_options: NativeCacheOptions,
}

/// Schedule settings of one periodic maintenance task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicTaskOptions {
    /// Cron expression, see [`crate::scheduler::CronSchedule`]
    pub schedule: String,
    /// Start the task when the cache is registered
    pub auto_start: bool,
    /// Reported as configured; the live state is in the cache stats
    pub running: bool,
}

impl PeriodicTaskOptions {
    fn with_schedule(schedule: &str) -> Self {
        Self {
            schedule: schedule.to_string(),
            auto_start: false,
            running: false,
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCacheOptions {
    /// Maximum number of entries
    pub max: usize,
    /// Default TTL in milliseconds, 0 = entries never expire
    pub ttl: u64,
    /// Restart an entry's TTL whenever it is read
    pub update_age_on_get: bool,
}

impl NativeCacheOptions {
    pub fn ttl_duration(&self) -> Duration {
        Duration::from_millis(self.ttl)
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            periodic_clearing: PeriodicTaskOptions::with_schedule(DEFAULT_CLEARING_SCHEDULE),
            periodic_pruning: PeriodicTaskOptions::with_schedule(DEFAULT_PRUNING_SCHEDULE),
            native_cache_options: NativeCacheOptions {
                max: DEFAULT_MAX_ENTRIES,
                ttl: DEFAULT_TTL_MS,
                update_age_on_get: false,
            },
        }
    }
}

impl CacheOptions {
    /// Defaults with `overrides` applied.
    pub fn from_overrides(overrides: &CacheOptionsOverrides) -> Self {
        Self::default().merge(overrides)
    }

    // == Merge ==
    /// Applies every field set in `overrides`; unset fields keep their value.
    pub fn merge(mut self, overrides: &CacheOptionsOverrides) -> Self {
        overrides
            .periodic_clearing
            .apply_to(&mut self.periodic_clearing);
        overrides
            .periodic_pruning
            .apply_to(&mut self.periodic_pruning);

        let native = &overrides.native_cache_options;
        let target = &mut self.native_cache_options;
        if let Some(max) = native.max {
            target.max = max;
        }
        if let Some(ttl) = native.ttl {
            target.ttl = ttl;
        }
        if let Some(update_age_on_get) = native.update_age_on_get {
            target.update_age_on_get = update_age_on_get;
        }
        self
    }

    // == Validate ==
    /// Checks values the type system cannot rule out.
    ///
    /// Schedules are validated when they are parsed.
    pub fn validate(&self) -> Result<()> {
        if self.native_cache_options.max == 0 {
            return Err(CacheError::InvalidArgument(
                "nativeCacheOptions.max must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// == Overrides ==
/// Partial [`CacheOptions`]; every field is optional.
///
/// Deserializes from the same camelCase JSON shape as `CacheOptions`.
/// Unknown fields are ignored and `null` leaves the default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheOptionsOverrides {
    pub periodic_clearing: PeriodicTaskOverrides,
    pub periodic_pruning: PeriodicTaskOverrides,
    pub native_cache_options: NativeCacheOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeriodicTaskOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
}

impl PeriodicTaskOverrides {
    fn apply_to(&self, target: &mut PeriodicTaskOptions) {
        if let Some(schedule) = &self.schedule {
            target.schedule.clone_from(schedule);
        }
        if let Some(auto_start) = self.auto_start {
            target.auto_start = auto_start;
        }
        if let Some(running) = self.running {
            target.running = running;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NativeCacheOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    /// Milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_age_on_get: Option<bool>,
}

impl CacheOptionsOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max(mut self, max: usize) -> Self {
        self.native_cache_options.max = Some(max);
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.native_cache_options.ttl = Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn update_age_on_get(mut self, update_age_on_get: bool) -> Self {
        self.native_cache_options.update_age_on_get = Some(update_age_on_get);
        self
    }

    pub fn clearing_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.periodic_clearing.schedule = Some(schedule.into());
        self
    }

    pub fn pruning_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.periodic_pruning.schedule = Some(schedule.into());
        self
    }

    pub fn auto_start_clearing(mut self, auto_start: bool) -> Self {
        self.periodic_clearing.auto_start = Some(auto_start);
        self
    }

    pub fn auto_start_pruning(mut self, auto_start: bool) -> Self {
        self.periodic_pruning.auto_start = Some(auto_start);
        self
    }
}
