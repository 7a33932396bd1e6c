// src/model/task.rs

use std::collections::BTreeSet;

use crate::types::{Day, LabelId, Minutes, ProjectId, StoreId, TaskId};

/// User-supplied fields of a task that is about to be added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    /// Estimated duration.
    pub duration: Minutes,
    /// Hard deadline (inclusive day index).
    pub due: Option<Day>,
    /// Day the task was created; earliest start when it has no prerequisites.
    pub created: Day,
    pub project: Option<ProjectId>,
    pub labels: BTreeSet<LabelId>,
}

impl NewTask {
    pub fn new(name: impl Into<String>, duration: Minutes) -> Self {
        Self {
            name: name.into(),
            duration,
            due: None,
            created: 0,
            project: None,
            labels: BTreeSet::new(),
        }
    }

    pub fn due(mut self, day: Day) -> Self {
        self.due = Some(day);
        self
    }

    pub fn created_on(mut self, day: Day) -> Self {
        self.created = day;
        self
    }
}

/// Completion state recorded once a task is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub day: Day,
}

/// A task in the graph.
///
/// The graph only hands out shared references; `parents`, `children`,
/// `earliest_start` and `completion` are maintained by
/// [`crate::dag::TaskGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    /// `None` until the store has answered the insert.
    pub store_id: Option<StoreId>,
    pub name: String,
    pub duration: Minutes,
    pub created: Day,
    /// Derived from `created` and the completion days of prerequisites.
    pub earliest_start: Day,
    pub due: Option<Day>,
    pub parents: BTreeSet<TaskId>,
    pub children: BTreeSet<TaskId>,
    pub completion: Option<Completion>,
    pub project: Option<ProjectId>,
    pub labels: BTreeSet<LabelId>,
    /// Minutes reported at completion.
    pub actual_minutes: Option<Minutes>,
    /// Minutes accumulated by the timer.
    pub tracked_minutes: Minutes,
}

impl Task {
    pub(crate) fn from_new(id: TaskId, new: NewTask) -> Self {
        Self {
            id,
            store_id: None,
            name: new.name,
            duration: new.duration,
            created: new.created,
            earliest_start: new.created,
            due: new.due,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
            completion: None,
            project: new.project,
            labels: new.labels,
            actual_minutes: None,
            tracked_minutes: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completion.is_some()
    }

    pub fn completion_day(&self) -> Option<Day> {
        self.completion.map(|c| c.day)
    }

    /// Incomplete and past its due day.
    pub fn is_overdue(&self) -> bool {
        !self.is_complete() && self.due.is_some_and(|due| due < 0)
    }
}

/// Lifecycle state of a task as seen by a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Incomplete and not placed by the last reoptimization.
    Unscheduled,
    Scheduled(Day),
    Completed(Day),
}
