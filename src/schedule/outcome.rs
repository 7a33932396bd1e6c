// src/schedule/outcome.rs

use std::collections::BTreeSet;

use crate::errors::InfeasibleError;
use crate::types::{Day, TaskId};

/// A task whose day changed between two reoptimizations.
///
/// `from == None`: newly scheduled. `to == None`: no longer scheduled
/// (completed, deleted or infeasible).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskMove {
    pub task: TaskId,
    pub from: Option<Day>,
    pub to: Option<Day>,
}

/// Result of one reoptimization, relative to the previous table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleOutcome {
    /// Days whose task list changed; collaborators redraw only these.
    pub changed_days: BTreeSet<Day>,
    pub moves: Vec<TaskMove>,
    /// Tasks that could not be placed. The rest of the table is valid.
    pub infeasible: Vec<InfeasibleError>,
}

impl ScheduleOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.changed_days.is_empty() && self.moves.is_empty()
    }

    pub fn is_feasible(&self) -> bool {
        self.infeasible.is_empty()
    }
}
