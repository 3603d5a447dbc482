//! Recurring Tasks
//!
//! Runs a task at every fire time of a cron schedule on a tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::cron::{CronSchedule, MissingHourPolicy};
use crate::error::{CacheError, Result};

// == Scheduler ==
/// Spawns recurring tasks onto a tokio runtime.
#[derive(Debug, Clone)]
pub struct Scheduler {
    runtime: Handle,
}

impl Scheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Binds to the runtime the caller is running on.
    pub fn current() -> Result<Self> {
        Handle::try_current().map(Self::new).map_err(|e| {
            CacheError::Internal(format!("no tokio runtime available for scheduling: {e}"))
        })
    }

    // == Schedule ==
    /// Runs `task` at every fire time of `schedule`, evaluated in UTC.
    pub fn schedule<F>(&self, label: impl Into<String>, schedule: CronSchedule, task: F) -> ScheduleHandle
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.schedule_in(label, schedule, Utc, MissingHourPolicy::Offset, task)
    }

    /// Runs `task` at every fire time of `schedule` on `timezone`'s wall
    /// clock.
    ///
    /// Each run executes on the blocking pool and is awaited before the next
    /// fire time is computed, so runs never overlap; a run that outlasts the
    /// period delays the next one. A run that fails or panics is logged and
    /// the schedule carries on.
    pub fn schedule_in<Tz, F>(
        &self,
        label: impl Into<String>,
        schedule: CronSchedule,
        timezone: Tz,
        missing_hour: MissingHourPolicy,
        task: F,
    ) -> ScheduleHandle
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let label = label.into();
        let expression = schedule.expression().to_string();
        let task = Arc::new(task);

        let task_label = label.clone();
        let join = self.runtime.spawn(async move {
            let label = task_label;
            debug!(task = %label, schedule = %schedule, "scheduled task started");

            let mut after = Utc::now().with_timezone(&timezone);
            loop {
                let Some(next) = schedule.next_after(&after, missing_hour) else {
                    info!(task = %label, schedule = %schedule, "schedule has no further fire times");
                    break;
                };
                tokio::time::sleep(until(&next)).await;

                let run = Arc::clone(&task);
                match tokio::task::spawn_blocking(move || run()).await {
                    Ok(Ok(())) => debug!(task = %label, "scheduled run completed"),
                    Ok(Err(err)) => {
                        let failure = CacheError::MaintenanceFailure(format!("{err:#}"));
                        error!(task = %label, error = %failure, "scheduled run failed");
                    }
                    Err(join_err) => {
                        let failure = CacheError::MaintenanceFailure(join_err.to_string());
                        error!(task = %label, error = %failure, "scheduled run panicked");
                    }
                }

                let now = Utc::now().with_timezone(&timezone);
                after = if now > next { now } else { next };
            }
        });

        ScheduleHandle {
            label,
            expression,
            join,
        }
    }
}

fn until<Tz: TimeZone>(at: &DateTime<Tz>) -> Duration {
    (at.with_timezone(&Utc) - Utc::now())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

// == Schedule Handle ==
/// A running schedule. Cancelled by [`ScheduleHandle::cancel`] or on drop.
///
/// Cancelling stops future runs; a run already executing finishes.
#[derive(Debug)]
pub struct ScheduleHandle {
    label: String,
    expression: String,
    join: JoinHandle<()>,
}

impl ScheduleHandle {
    pub fn cancel(self) {
        debug!(task = %self.label, "cancelling scheduled task");
        // Drop aborts the timer loop
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}
