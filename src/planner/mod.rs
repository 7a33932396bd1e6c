// src/planner/mod.rs

//! Mutation protocol.
//!
//! [`Planner`] is the single owner of the task graph, the calendar and the
//! day assignment table. Every mutation:
//! 1. validates at the boundary (unknown ids, cycles),
//! 2. updates the in-memory model,
//! 3. reoptimizes synchronously when scheduling inputs changed,
//! 4. returns a [`MutationReport`] with the schedule diff and the
//!    persistence commands for the store worker.
//!
//! The planner performs no IO and never waits for the store. Callers must not
//! invoke mutations concurrently; it is a plain `&mut self` API.

use std::collections::BTreeMap;

use time::Date;
use tracing::debug;

use crate::calendar::Calendar;
use crate::dag::TaskGraph;
use crate::errors::{InfeasibleError, StaleReference};
use crate::model::{Label, Project};
use crate::schedule::{DayAssignmentTable, ScheduleOutcome, Scheduler};
use crate::types::{LabelId, Minutes, ProjectId};

pub mod groups;
pub mod persist;
pub mod protocol;
pub mod queries;
pub mod restore;
pub mod timer;

pub use persist::PersistCommand;
pub use timer::{ActiveTimer, TimerReading};

use persist::SyncState;

/// Tunables supplied by the config source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerSettings {
    /// Nominal time budget of every day.
    pub daily_minutes: Minutes,
    /// Days searched by the scheduler before declaring a task infeasible.
    pub horizon_days: u32,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            daily_minutes: 480,
            horizon_days: 365,
        }
    }
}

/// What a single mutation changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationReport {
    /// Schedule diff; empty when the mutation did not reoptimize.
    pub outcome: ScheduleOutcome,
    /// Fire-and-forget writes for the persistence collaborator.
    pub persist: Vec<PersistCommand>,
    /// Stale references the mutation ignored.
    pub warnings: Vec<StaleReference>,
}

impl MutationReport {
    pub(crate) fn stale(reference: StaleReference) -> Self {
        tracing::warn!(%reference, "mutation ignored");
        Self {
            warnings: vec![reference],
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct Planner {
    /// Calendar date of day 0.
    origin: Date,
    settings: PlannerSettings,
    graph: TaskGraph,
    calendar: Calendar,
    table: DayAssignmentTable,
    scheduler: Scheduler,
    projects: BTreeMap<ProjectId, Project>,
    labels: BTreeMap<LabelId, Label>,
    next_project: u64,
    next_label: u64,
    timer: Option<ActiveTimer>,
    infeasible: Vec<InfeasibleError>,
    sync: SyncState,
}

impl Planner {
    /// Empty planner whose day 0 is `origin`.
    pub fn new(settings: PlannerSettings, origin: Date) -> Self {
        Self {
            origin,
            settings,
            graph: TaskGraph::new(),
            calendar: Calendar::new(settings.daily_minutes),
            table: DayAssignmentTable::new(),
            scheduler: Scheduler::new(settings.horizon_days),
            projects: BTreeMap::new(),
            labels: BTreeMap::new(),
            next_project: 0,
            next_label: 0,
            timer: None,
            infeasible: Vec::new(),
            sync: SyncState::default(),
        }
    }

    pub fn origin(&self) -> Date {
        self.origin
    }

    pub fn settings(&self) -> PlannerSettings {
        self.settings
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn table(&self) -> &DayAssignmentTable {
        &self.table
    }

    /// Full recomputation of the day assignment table.
    ///
    /// Calling it twice without an intervening mutation yields the same table
    /// and an empty diff.
    pub fn reoptimize(&mut self) -> ScheduleOutcome {
        let outcome = self
            .scheduler
            .reoptimize(&self.graph, &self.calendar, &mut self.table);
        self.infeasible = outcome.infeasible.clone();
        if !outcome.is_unchanged() {
            debug!(
                changed_days = ?outcome.changed_days,
                infeasible = outcome.infeasible.len(),
                "schedule changed"
            );
        }
        outcome
    }
}
