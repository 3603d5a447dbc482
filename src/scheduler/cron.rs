//! Cron Expressions
//!
//! Parses seven-field cron expressions and computes their fire times.
//!
//! ```text
//! ┌──────────── second        0-59
//! │ ┌────────── minute        0-59
//! │ │ ┌──────── hour          0-23
//! │ │ │ ┌────── day of month  1-31
//! │ │ │ │ ┌──── month         1-12 or JAN-DEC
//! │ │ │ │ │ ┌── day of week   0-7 or SUN-SAT (0 and 7 are Sunday)
//! │ │ │ │ │ │ ┌ year          1970-2199
//! * * * * * * *
//! ```
//!
//! Six fields omit the year; five fields also omit the second, which is then
//! fixed at 0. Every field accepts `*`, `?`, values, `a-b` ranges, `a,b`
//! lists and `/n` steps.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone,
    Timelike,
};

use crate::error::{CacheError, Result};

const MONTH_NAMES: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

const MIN_YEAR: u32 = 1970;
const MAX_YEAR: u32 = 2199;

// == Missing Hour Policy ==
/// What to do with a wall-clock fire time that a DST transition skips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingHourPolicy {
    /// Fire at the same instant the pre-transition clock would have named,
    /// e.g. 02:30 in a skipped hour fires at 03:30
    #[default]
    Offset,
    /// Drop the fire time
    Skip,
}

// == Field Spec ==
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    /// Names for values starting at `names_from`
    names: &'static [&'static str],
    names_from: u32,
}

const SECOND: FieldSpec = FieldSpec::numeric("second", 0, 59);
const MINUTE: FieldSpec = FieldSpec::numeric("minute", 0, 59);
const HOUR: FieldSpec = FieldSpec::numeric("hour", 0, 23);
const DAY_OF_MONTH: FieldSpec = FieldSpec::numeric("day of month", 1, 31);
const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: MONTH_NAMES,
    names_from: 1,
};
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day of week",
    min: 0,
    max: 7,
    names: WEEKDAY_NAMES,
    names_from: 0,
};
const YEAR: FieldSpec = FieldSpec::numeric("year", MIN_YEAR, MAX_YEAR);

impl FieldSpec {
    const fn numeric(name: &'static str, min: u32, max: u32) -> Self {
        Self {
            name,
            min,
            max,
            names: &[],
            names_from: 0,
        }
    }

    fn value(&self, token: &str) -> std::result::Result<u32, String> {
        let upper = token.to_ascii_uppercase();
        let value = match self.names.iter().position(|name| *name == upper) {
            Some(pos) => self.names_from + pos as u32,
            None => token
                .parse::<u32>()
                .map_err(|_| format!("invalid {} value '{}'", self.name, token))?,
        };
        if value < self.min || value > self.max {
            return Err(format!(
                "{} value {} outside {}-{}",
                self.name, value, self.min, self.max
            ));
        }
        Ok(value)
    }

    /// Expands one field into the set of values it matches.
    fn parse(&self, field: &str) -> std::result::Result<BTreeSet<u32>, String> {
        let mut values = BTreeSet::new();

        for part in field.split(',') {
            let (base, step) = match part.split_once('/') {
                Some((base, step)) => {
                    let step = step
                        .parse::<u32>()
                        .ok()
                        .filter(|step| *step > 0)
                        .ok_or_else(|| format!("invalid {} step '{}'", self.name, step))?;
                    (base, Some(step))
                }
                None => (part, None),
            };

            let (start, end) = match base {
                "*" | "?" => (self.min, self.max),
                _ => match base.split_once('-') {
                    Some((from, to)) => (self.value(from)?, self.value(to)?),
                    None => {
                        let value = self.value(base)?;
                        // `a/n` runs from a to the end of the range
                        (value, if step.is_some() { self.max } else { value })
                    }
                },
            };
            if start > end {
                return Err(format!("{} range {}-{} is reversed", self.name, start, end));
            }

            let step = step.unwrap_or(1) as usize;
            values.extend((start..=end).step_by(step));
        }

        Ok(values)
    }
}

fn is_unrestricted(field: &str) -> bool {
    field.starts_with('*') || field == "?"
}

// == Cron Schedule ==
/// A parsed cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    seconds: BTreeSet<u32>,
    minutes: BTreeSet<u32>,
    hours: BTreeSet<u32>,
    days_of_month: BTreeSet<u32>,
    months: BTreeSet<u32>,
    /// 0 = Sunday
    days_of_week: BTreeSet<u32>,
    years: BTreeSet<u32>,
    /// With both day fields restricted a day matches if either does
    days_or: bool,
}

impl CronSchedule {
    // == Parse ==
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let (second, rest) = match fields.len() {
            5 => ("0", &fields[..]),
            6 | 7 => (fields[0], &fields[1..]),
            n => {
                return Err(CacheError::invalid_schedule(
                    expression,
                    format!("expected 5, 6 or 7 fields, got {n}"),
                ))
            }
        };
        let year = rest.get(5).copied().unwrap_or("*");
        let invalid = |reason: String| CacheError::invalid_schedule(expression, reason);

        let mut days_of_week = DAY_OF_WEEK.parse(rest[4]).map_err(invalid)?;
        if days_of_week.remove(&7) {
            days_of_week.insert(0);
        }

        Ok(Self {
            expression: expression.trim().to_string(),
            seconds: SECOND.parse(second).map_err(invalid)?,
            minutes: MINUTE.parse(rest[0]).map_err(invalid)?,
            hours: HOUR.parse(rest[1]).map_err(invalid)?,
            days_of_month: DAY_OF_MONTH.parse(rest[2]).map_err(invalid)?,
            months: MONTH.parse(rest[3]).map_err(invalid)?,
            days_of_week,
            years: YEAR.parse(year).map_err(invalid)?,
            days_or: !is_unrestricted(rest[2]) && !is_unrestricted(rest[4]),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = self.days_of_month.contains(&date.day());
        let dow = self
            .days_of_week
            .contains(&date.weekday().num_days_from_sunday());
        if self.days_or {
            dom || dow
        } else {
            dom && dow
        }
    }

    // == Next Wall-Clock Time ==
    /// First matching wall-clock time strictly after `after`, ignoring
    /// timezones.
    pub fn next_naive_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut t = after.with_nanosecond(0)? + Duration::seconds(1);

        // Every `continue` moves `t` forward and the year set is bounded
        loop {
            let year = u32::try_from(t.year()).ok()?;
            let next_year = *self.years.range(year..).next()?;
            if next_year != year {
                t = start_of_month(next_year, 1)?;
                continue;
            }

            match self.months.range(t.month()..).next() {
                None => {
                    t = start_of_month(year + 1, 1)?;
                    continue;
                }
                Some(&month) if month != t.month() => {
                    t = start_of_month(year, month)?;
                    continue;
                }
                Some(_) => {}
            }

            let date = t.date();
            if !self.day_matches(date) {
                t = date.succ_opt()?.and_hms_opt(0, 0, 0)?;
                continue;
            }

            match self.hours.range(t.hour()..).next() {
                None => {
                    t = date.succ_opt()?.and_hms_opt(0, 0, 0)?;
                    continue;
                }
                Some(&hour) if hour != t.hour() => {
                    t = date.and_hms_opt(hour, 0, 0)?;
                    continue;
                }
                Some(_) => {}
            }

            match self.minutes.range(t.minute()..).next() {
                None => {
                    t = date.and_hms_opt(t.hour(), 0, 0)? + Duration::hours(1);
                    continue;
                }
                Some(&minute) if minute != t.minute() => {
                    t = date.and_hms_opt(t.hour(), minute, 0)?;
                    continue;
                }
                Some(_) => {}
            }

            match self.seconds.range(t.second()..).next() {
                None => {
                    t = date.and_hms_opt(t.hour(), t.minute(), 0)? + Duration::minutes(1);
                }
                Some(&second) => return date.and_hms_opt(t.hour(), t.minute(), second),
            }
        }
    }

    // == Next Fire Time ==
    /// First fire time strictly after `after`, evaluated on the wall clock of
    /// `after`'s timezone.
    ///
    /// A wall-clock time repeated by a DST transition fires once, at its
    /// earliest instant. A skipped one is handled per `policy`.
    pub fn next_after<Tz: TimeZone>(
        &self,
        after: &DateTime<Tz>,
        policy: MissingHourPolicy,
    ) -> Option<DateTime<Tz>> {
        let tz = after.timezone();
        let mut cursor = after.naive_local();

        loop {
            let candidate = self.next_naive_after(cursor)?;
            let resolved = match tz.from_local_datetime(&candidate) {
                LocalResult::Single(at) => Some(at),
                LocalResult::Ambiguous(earliest, _) => Some(earliest),
                LocalResult::None => match policy {
                    MissingHourPolicy::Offset => resolve_in_gap(&tz, candidate),
                    MissingHourPolicy::Skip => None,
                },
            };
            match resolved {
                Some(at) if at > *after => return Some(at),
                _ => cursor = candidate,
            }
        }
    }

    /// Fire times after `from`, in order.
    pub fn upcoming<'a, Tz: TimeZone + 'a>(
        &'a self,
        from: DateTime<Tz>,
        policy: MissingHourPolicy,
    ) -> impl Iterator<Item = DateTime<Tz>> + 'a {
        std::iter::successors(self.next_after(&from, policy), move |previous| {
            self.next_after(previous, policy)
        })
    }
}

fn start_of_month(year: u32, month: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, 1)?.and_hms_opt(0, 0, 0)
}

/// Maps a wall-clock time inside a DST gap using the offset in force just
/// before the gap.
fn resolve_in_gap<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    let before = (1..=48)
        .find_map(|hours| {
            tz.from_local_datetime(&(local - Duration::hours(hours)))
                .earliest()
        })?
        .offset()
        .fix();
    let utc = local - Duration::seconds(i64::from(before.local_minus_utc()));
    Some(tz.from_utc_datetime(&utc))
}

impl FromStr for CronSchedule {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
