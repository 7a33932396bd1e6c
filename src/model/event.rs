// src/model/event.rs

use crate::errors::{PlannerError, Result};
use crate::types::{Day, EventId, Minutes, StoreId};

pub const MINUTES_PER_DAY: Minutes = 24 * 60;

/// A fixed time block to be added to the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub name: String,
    pub day: Day,
    /// Start offset within the day, in minutes from midnight.
    pub start: Minutes,
    /// End offset (exclusive).
    pub end: Minutes,
}

impl NewEvent {
    pub fn new(name: impl Into<String>, day: Day, start: Minutes, end: Minutes) -> Self {
        Self {
            name: name.into(),
            day,
            start,
            end,
        }
    }

    /// Interval must be non-empty and lie within a single day.
    pub fn validate(&self) -> Result<()> {
        if self.start < 0 || self.end > MINUTES_PER_DAY || self.start >= self.end {
            return Err(PlannerError::InvalidInput(format!(
                "event '{}' has invalid interval {}..{} (must satisfy 0 <= start < end <= {})",
                self.name, self.start, self.end, MINUTES_PER_DAY
            )));
        }
        Ok(())
    }
}

/// An immovable calendar block. Edited only by delete + reinsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub store_id: Option<StoreId>,
    pub name: String,
    pub day: Day,
    pub start: Minutes,
    pub end: Minutes,
}

impl Event {
    pub(crate) fn from_new(id: EventId, new: NewEvent) -> Self {
        Self {
            id,
            store_id: None,
            name: new.name,
            day: new.day,
            start: new.start,
            end: new.end,
        }
    }

    pub fn duration(&self) -> Minutes {
        self.end - self.start
    }
}
