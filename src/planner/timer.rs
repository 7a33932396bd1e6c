// src/planner/timer.rs

//! Wall-clock timer against a single task.
//!
//! The timer never changes the schedule. Stopping it adds the elapsed minutes
//! to the task's tracked time and returns them as the candidate actual time
//! for [`Planner::complete_task`].

use time::OffsetDateTime;
use tracing::info;

use crate::clock::elapsed_minutes;
use crate::errors::StaleReference;
use crate::planner::{MutationReport, PersistCommand, Planner};
use crate::types::{EntityRef, Minutes, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTimer {
    pub task: TaskId,
    pub started_at: OffsetDateTime,
}

/// Elapsed time of a stopped timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerReading {
    pub task: TaskId,
    pub elapsed: Minutes,
}

impl Planner {
    pub fn active_timer(&self) -> Option<ActiveTimer> {
        self.timer
    }

    /// Start timing `task`. A timer already running on another task is
    /// stopped first and its reading returned.
    pub fn timer_start(&mut self, task: TaskId, now: OffsetDateTime) -> (Option<TimerReading>, MutationReport) {
        if !self.graph.contains(task) {
            return (None, MutationReport::stale(StaleReference::Task(task)));
        }

        let (previous, mut report) = self.timer_stop(now);
        self.timer = Some(ActiveTimer {
            task,
            started_at: now,
        });
        report.persist.retain(|c| !matches!(c, PersistCommand::SaveSession(_)));
        report.persist.push(PersistCommand::SaveSession(self.session_record()));
        info!(task = %task, "timer started");
        (previous, report)
    }

    /// Stop the running timer, if any.
    pub fn timer_stop(&mut self, now: OffsetDateTime) -> (Option<TimerReading>, MutationReport) {
        let Some(timer) = self.timer.take() else {
            return (None, MutationReport::default());
        };

        let elapsed = elapsed_minutes(timer.started_at, now);
        let mut report = MutationReport::default();
        if let Some(task) = self.graph.get_mut(timer.task) {
            task.tracked_minutes = task.tracked_minutes.saturating_add(elapsed);
            self.persist_changed(EntityRef::Task(timer.task), &mut report.persist);
        }
        report.persist.push(PersistCommand::SaveSession(self.session_record()));
        info!(task = %timer.task, elapsed, "timer stopped");

        (
            Some(TimerReading {
                task: timer.task,
                elapsed,
            }),
            report,
        )
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::model::NewTask;
    use crate::planner::test_support::planner;

    #[test]
    fn stop_accumulates_tracked_minutes_without_rescheduling() {
        let mut p = planner(60);
        let (a, _) = p.add_task(NewTask::new("a", 30), &[]).unwrap();
        let table_before = p.table().clone();

        p.timer_start(a, datetime!(2025-06-02 09:00 UTC));
        let (reading, report) = p.timer_stop(datetime!(2025-06-02 09:25 UTC));

        assert_eq!(reading, Some(TimerReading { task: a, elapsed: 25 }));
        assert!(report.outcome.is_unchanged());
        assert_eq!(p.graph().get(a).unwrap().tracked_minutes, 25);
        assert_eq!(p.table(), &table_before);
        assert!(p.active_timer().is_none());
    }

    #[test]
    fn starting_a_second_timer_stops_the_first() {
        let mut p = planner(60);
        let (a, _) = p.add_task(NewTask::new("a", 30), &[]).unwrap();
        let (b, _) = p.add_task(NewTask::new("b", 30), &[]).unwrap();

        p.timer_start(a, datetime!(2025-06-02 09:00 UTC));
        let (previous, _) = p.timer_start(b, datetime!(2025-06-02 09:10 UTC));
        assert_eq!(previous, Some(TimerReading { task: a, elapsed: 10 }));
        assert_eq!(p.active_timer().map(|t| t.task), Some(b));
    }

    #[test]
    fn elapsed_minutes_feed_completion() {
        let mut p = planner(60);
        let (a, _) = p.add_task(NewTask::new("a", 30), &[]).unwrap();
        p.timer_start(a, datetime!(2025-06-02 09:00 UTC));
        let (reading, _) = p.timer_stop(datetime!(2025-06-02 09:45 UTC));

        p.complete_task(a, reading.map(|r| r.elapsed)).unwrap();
        assert_eq!(p.graph().get(a).unwrap().actual_minutes, Some(45));
        assert_eq!(p.calendar().today_consumed(), 45);
    }

    #[test]
    fn timer_on_unknown_task_is_stale() {
        let mut p = planner(60);
        let (_, report) = p.timer_start(TaskId(3), datetime!(2025-06-02 09:00 UTC));
        assert_eq!(report.warnings, vec![StaleReference::Task(TaskId(3))]);
        assert!(p.active_timer().is_none());
    }
}
