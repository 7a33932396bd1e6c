// src/errors.rs

//! Error taxonomy for the planner core.
//!
//! - [`GraphError`]: a mutation was rejected at the boundary (unknown id, cycle).
//! - [`InfeasibleError`]: reoptimization could not place a task; reported next
//!   to the partial schedule, never raised as a failure.
//! - [`StaleReference`]: a mutation named an entity that no longer exists;
//!   the mutation is a no-op and the reference is returned as a warning.
//! - [`PlannerError`]: crate-wide error for everything that is a real failure.

use thiserror::Error;

use crate::types::{Day, EventId, LabelId, ProjectId, TaskId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    #[error("adding prerequisite {parent} to {child} would close a cycle")]
    WouldCycle { child: TaskId, parent: TaskId },

    #[error("task {0} cannot be its own prerequisite")]
    SelfDependency(TaskId),

    #[error("task {0} is already completed")]
    CompletedTask(TaskId),

    #[error("task {task} cannot complete on day {day}; earliest start is day {earliest}")]
    CompletionBeforeEarliestStart { task: TaskId, day: Day, earliest: Day },
}

/// Why a task could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfeasibleReason {
    /// No day between the earliest start and the due date has enough budget.
    DeadlineMissed { due: Day, earliest: Day },
    /// No day inside the scheduling horizon has enough budget.
    HorizonExhausted { horizon: Day },
    /// An incomplete prerequisite could not be placed itself.
    BlockedByPrerequisite { parent: TaskId },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("task {task} cannot be scheduled: {reason:?}")]
pub struct InfeasibleError {
    pub task: TaskId,
    pub reason: InfeasibleReason,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReference {
    #[error("stale task reference {0}")]
    Task(TaskId),

    #[error("stale event reference {0}")]
    Event(EventId),

    #[error("stale project reference {0}")]
    Project(ProjectId),

    #[error("stale label reference {0}")]
    Label(LabelId),
}

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML encoding error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PlannerError>;
