// src/model/mod.rs

//! Planner entities.
//!
//! - [`task`]: tasks and their completion state.
//! - [`event`]: fixed calendar blocks.
//! - [`grouping`]: projects and labels (display grouping only).

pub mod event;
pub mod grouping;
pub mod task;

pub use event::{Event, NewEvent, MINUTES_PER_DAY};
pub use grouping::{Label, Project};
pub use task::{Completion, NewTask, Task, TaskState};
