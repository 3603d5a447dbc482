//! Scheduler Module
//!
//! Cron expressions and the recurring tasks that run on them.
//!
//! # Components
//! - `CronSchedule`: parsed seven-field cron expression
//! - `Scheduler`: spawns a task at every fire time of a schedule
//! - `ScheduleHandle`: cancels the spawned task

mod cron;
mod task;

pub use cron::{CronSchedule, MissingHourPolicy};
pub use task::{ScheduleHandle, Scheduler};
