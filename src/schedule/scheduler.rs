// src/schedule/scheduler.rs

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::calendar::Calendar;
use crate::dag::{topological_order, TaskGraph};
use crate::errors::{InfeasibleError, InfeasibleReason};
use crate::model::Task;
use crate::schedule::outcome::ScheduleOutcome;
use crate::schedule::table::DayAssignmentTable;
use crate::types::{Day, Minutes, TaskId};

/// Result of a from-scratch scheduling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub table: DayAssignmentTable,
    pub infeasible: Vec<InfeasibleError>,
}

/// Greedy list scheduler.
///
/// Tasks are visited in the graph's deterministic topological order
/// (due date ascending, then id). Each task goes to the first day, at or after
/// its earliest start and after every incomplete prerequisite's day, whose
/// remaining budget covers its duration. The search stops at the due date or
/// at the horizon, whichever comes first.
///
/// Every pass starts from an empty table; there is no incremental patching.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    horizon: Day,
}

impl Scheduler {
    /// `horizon_days` is the number of days (starting at day 0) searched
    /// before a task is declared infeasible. Clamped to at least 1.
    pub fn new(horizon_days: u32) -> Self {
        Self {
            horizon: Day::from(horizon_days.max(1)),
        }
    }

    pub fn horizon(&self) -> Day {
        self.horizon
    }

    /// Build a fresh plan. O(D·T) worst case.
    pub fn plan(&self, graph: &TaskGraph, calendar: &Calendar) -> Plan {
        let mut table = DayAssignmentTable::new();
        let mut infeasible = Vec::new();
        let mut remaining = RemainingBudget::new(calendar);

        for id in topological_order(graph) {
            let Some(task) = graph.get(id) else { continue };
            match self.place(task, graph, &table, &mut remaining) {
                Ok(day) => {
                    debug!(task = %id, day, duration = task.duration, "task placed");
                    table.assign(id, day);
                }
                Err(reason) => {
                    warn!(task = %id, name = %task.name, ?reason, "task left unscheduled");
                    infeasible.push(InfeasibleError { task: id, reason });
                }
            }
        }

        Plan { table, infeasible }
    }

    /// Recompute `table` from scratch and report what changed.
    pub fn reoptimize(
        &self,
        graph: &TaskGraph,
        calendar: &Calendar,
        table: &mut DayAssignmentTable,
    ) -> ScheduleOutcome {
        let plan = self.plan(graph, calendar);
        let (changed_days, moves) = table.diff(&plan.table);
        *table = plan.table;

        info!(
            scheduled = table.len(),
            infeasible = plan.infeasible.len(),
            changed_days = changed_days.len(),
            moved = moves.len(),
            "reoptimization finished"
        );

        ScheduleOutcome {
            changed_days,
            moves,
            infeasible: plan.infeasible,
        }
    }

    fn place(
        &self,
        task: &Task,
        graph: &TaskGraph,
        table: &DayAssignmentTable,
        remaining: &mut RemainingBudget<'_>,
    ) -> Result<Day, InfeasibleReason> {
        let mut start = task.earliest_start.max(0);
        for &parent in &task.parents {
            if graph.get(parent).is_none_or(Task::is_complete) {
                continue;
            }
            match table.day_of(parent) {
                Some(day) => start = start.max(day + 1),
                None => return Err(InfeasibleReason::BlockedByPrerequisite { parent }),
            }
        }

        let horizon_end = self.horizon - 1;
        let last = match task.due {
            Some(due) => due.min(horizon_end),
            None => horizon_end,
        };

        for day in start..=last {
            if remaining.get(day) >= task.duration {
                remaining.reserve(day, task.duration);
                return Ok(day);
            }
        }

        match task.due {
            Some(due) if due <= horizon_end => Err(InfeasibleReason::DeadlineMissed {
                due,
                earliest: start,
            }),
            _ => Err(InfeasibleReason::HorizonExhausted {
                horizon: self.horizon,
            }),
        }
    }
}

/// Lazily materialized per-day remaining budget for one pass.
struct RemainingBudget<'a> {
    calendar: &'a Calendar,
    reserved: BTreeMap<Day, Minutes>,
}

impl<'a> RemainingBudget<'a> {
    fn new(calendar: &'a Calendar) -> Self {
        Self {
            calendar,
            reserved: BTreeMap::new(),
        }
    }

    fn get(&self, day: Day) -> Minutes {
        self.calendar
            .budget(day)
            .saturating_sub(self.reserved.get(&day).copied().unwrap_or(0))
    }

    fn reserve(&mut self, day: Day, minutes: Minutes) {
        let reserved = self.reserved.entry(day).or_insert(0);
        *reserved = reserved.saturating_add(minutes);
    }
}
