// src/schedule/mod.rs

//! Day scheduling.
//!
//! - [`table`] is the Day Assignment Table: day -> ordered task list.
//! - [`scheduler`] runs greedy earliest-deadline-first list scheduling over
//!   the task graph's topological order.
//! - [`outcome`] describes what changed between two tables.

pub mod outcome;
pub mod scheduler;
pub mod table;

pub use outcome::{ScheduleOutcome, TaskMove};
pub use scheduler::{Plan, Scheduler};
pub use table::DayAssignmentTable;
