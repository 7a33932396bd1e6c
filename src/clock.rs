// src/clock.rs

//! Clock source and day-index arithmetic.
//!
//! The planner works in day indices relative to an origin date (today = day 0).
//! The store encodes dates as days since 1970-01-01; conversion helpers for
//! both live here.

use std::fmt::Debug;

use time::{Date, Duration, OffsetDateTime};

use crate::errors::{PlannerError, Result};
use crate::types::{Day, Minutes};

/// Julian day number of 1970-01-01.
const UNIX_EPOCH_JULIAN_DAY: i64 = 2_440_588;

/// Source of "now" and "today".
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Wall clock in the local offset, falling back to UTC when the local offset
/// cannot be determined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Clock frozen at a given instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Day index of `date` relative to `origin`.
pub fn day_index(origin: Date, date: Date) -> Day {
    (date - origin).whole_days()
}

/// Calendar date of day index `day` relative to `origin`.
pub fn date_at(origin: Date, day: Day) -> Result<Date> {
    origin
        .checked_add(Duration::days(day))
        .ok_or_else(|| PlannerError::InvalidInput(format!("day {day} is out of range")))
}

/// Days since 1970-01-01.
pub fn to_epoch_day(date: Date) -> i64 {
    i64::from(date.to_julian_day()) - UNIX_EPOCH_JULIAN_DAY
}

pub fn from_epoch_day(epoch_day: i64) -> Result<Date> {
    let julian = i32::try_from(epoch_day + UNIX_EPOCH_JULIAN_DAY)
        .map_err(|_| PlannerError::InvalidInput(format!("epoch day {epoch_day} is out of range")))?;
    Date::from_julian_day(julian)
        .map_err(|e| PlannerError::InvalidInput(format!("epoch day {epoch_day}: {e}")))
}

/// Convert a stored epoch day to a day index relative to `origin`.
pub fn epoch_day_to_index(origin: Date, epoch_day: i64) -> Day {
    epoch_day - to_epoch_day(origin)
}

/// Convert a day index relative to `origin` to a stored epoch day.
pub fn index_to_epoch_day(origin: Date, day: Day) -> i64 {
    to_epoch_day(origin) + day
}

/// Whole minutes elapsed from `start` to `end`, clamped at zero.
pub fn elapsed_minutes(start: OffsetDateTime, end: OffsetDateTime) -> Minutes {
    (end - start).whole_minutes().max(0)
}
