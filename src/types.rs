// src/types.rs

//! Identifier and unit types shared across the planner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Day index: offset in days from the planner's origin date (today = 0).
///
/// Negative values are days in the past (e.g. an overdue due date).
pub type Day = i64;

/// Durations and budgets are tracked in whole minutes.
pub type Minutes = i64;

macro_rules! local_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

local_id!(
    /// In-memory handle of a task. Stable for the lifetime of a [`crate::planner::Planner`].
    TaskId,
    "task"
);
local_id!(
    /// In-memory handle of a calendar event.
    EventId,
    "event"
);
local_id!(
    /// In-memory handle of a project.
    ProjectId,
    "project"
);
local_id!(
    /// In-memory handle of a label.
    LabelId,
    "label"
);

/// Identifier handed out by the persistent store after an insert completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub i64);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StoreId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(StoreId)
            .map_err(|_| format!("invalid store id: {s:?}"))
    }
}

/// Kind of persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Task,
    Event,
    Project,
    Label,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Task => "task",
            EntityKind::Event => "event",
            EntityKind::Project => "project",
            EntityKind::Label => "label",
        };
        f.write_str(name)
    }
}

/// Reference to any entity the planner persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Task(TaskId),
    Event(EventId),
    Project(ProjectId),
    Label(LabelId),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Task(_) => EntityKind::Task,
            EntityRef::Event(_) => EntityKind::Event,
            EntityRef::Project(_) => EntityKind::Project,
            EntityRef::Label(_) => EntityKind::Label,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Task(id) => id.fmt(f),
            EntityRef::Event(id) => id.fmt(f),
            EntityRef::Project(id) => id.fmt(f),
            EntityRef::Label(id) => id.fmt(f),
        }
    }
}
