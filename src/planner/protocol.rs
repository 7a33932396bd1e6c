// src/planner/protocol.rs

//! Task, event and today-time mutations.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::errors::{PlannerError, Result, StaleReference};
use crate::model::{NewEvent, NewTask};
use crate::planner::{MutationReport, PersistCommand, Planner};
use crate::types::{Day, EntityRef, EventId, Minutes, TaskId};

impl Planner {
    /// Insert a task after its prerequisites and reoptimize.
    ///
    /// Nothing is inserted if a parent is unknown or an edge would close a
    /// cycle.
    pub fn add_task(&mut self, new: NewTask, parents: &[TaskId]) -> Result<(TaskId, MutationReport)> {
        validate_task_fields(&new.name, new.duration)?;
        if let Some(project) = new.project {
            if !self.projects.contains_key(&project) {
                return Err(PlannerError::InvalidInput(format!("unknown project {project}")));
            }
        }
        if let Some(label) = new.labels.iter().find(|l| !self.labels.contains_key(l)) {
            return Err(PlannerError::InvalidInput(format!("unknown label {label}")));
        }

        let project = new.project;
        let labels = new.labels.clone();
        let id = self.graph.add_task(new, parents)?;

        if let Some(project) = project.and_then(|p| self.projects.get_mut(&p)) {
            project.members.push(id);
        }
        for label in labels {
            if let Some(label) = self.labels.get_mut(&label) {
                label.members.insert(id);
            }
        }

        let mut persist = Vec::new();
        self.persist_new(EntityRef::Task(id), &mut persist);
        let outcome = self.reoptimize();
        info!(task = %id, ?parents, "task added");

        Ok((
            id,
            MutationReport {
                outcome,
                persist,
                warnings: Vec::new(),
            },
        ))
    }

    /// Complete a task today.
    ///
    /// `actual_minutes` (defaulting to the estimate) is recorded on the task
    /// and added to today's consumed time, shrinking day 0's budget for the
    /// remaining tasks.
    pub fn complete_task(&mut self, id: TaskId, actual_minutes: Option<Minutes>) -> Result<MutationReport> {
        let Some(task) = self.graph.get(id) else {
            return Ok(MutationReport::stale(StaleReference::Task(id)));
        };
        let actual = actual_minutes.unwrap_or(task.duration);
        if actual < 0 {
            return Err(PlannerError::InvalidInput(format!(
                "actual minutes must be >= 0 (got {actual})"
            )));
        }

        self.graph.mark_complete(id, 0)?;
        if let Some(task) = self.graph.get_mut(id) {
            task.actual_minutes = Some(actual);
        }
        if self.timer.is_some_and(|t| t.task == id) {
            warn!(task = %id, "task completed with its timer running; timer discarded");
            self.timer = None;
        }
        self.calendar.add_today_consumed(actual);

        let mut persist = Vec::new();
        self.persist_changed(EntityRef::Task(id), &mut persist);
        persist.push(PersistCommand::SaveSession(self.session_record()));
        let outcome = self.reoptimize();
        info!(task = %id, actual, "task completed");

        Ok(MutationReport {
            outcome,
            persist,
            warnings: Vec::new(),
        })
    }

    /// Remove a task, detach its edges and reoptimize.
    ///
    /// Children lose the prerequisite; nothing is re-linked.
    pub fn delete_task(&mut self, id: TaskId) -> Result<MutationReport> {
        if !self.graph.contains(id) {
            return Ok(MutationReport::stale(StaleReference::Task(id)));
        }
        let task = self.graph.remove_task(id)?;

        let mut persist = Vec::new();
        if let Some(project) = task.project.and_then(|p| self.projects.get_mut(&p)) {
            project.members.retain(|m| *m != id);
        }
        for label in &task.labels {
            if let Some(label) = self.labels.get_mut(label) {
                label.members.remove(&id);
            }
        }
        let session_changed = self.timer.is_some_and(|t| t.task == id);
        if session_changed {
            self.timer = None;
        }

        self.persist_deleted(EntityRef::Task(id), task.store_id, &mut persist);
        let neighbours = task
            .parents
            .iter()
            .chain(task.children.iter())
            .map(|t| EntityRef::Task(*t))
            .chain(task.project.map(EntityRef::Project))
            .chain(task.labels.iter().map(|l| EntityRef::Label(*l)));
        for entity in neighbours.collect::<Vec<_>>() {
            self.persist_changed(entity, &mut persist);
        }
        if session_changed {
            persist.push(PersistCommand::SaveSession(self.session_record()));
        }

        let outcome = self.reoptimize();
        info!(task = %id, name = %task.name, "task deleted");

        Ok(MutationReport {
            outcome,
            persist,
            warnings: Vec::new(),
        })
    }

    /// Complete the selected overdue tasks on day 0 and reoptimize once.
    ///
    /// Tasks not in `selected` stay incomplete. Each id is checked against
    /// the state before the batch; ids that are unknown, not overdue or not
    /// yet startable today are skipped with a warning.
    pub fn mark_overdue_batch(&mut self, selected: &[TaskId]) -> Result<MutationReport> {
        let mut warnings = Vec::new();
        let mut batch = BTreeSet::new();

        for &id in selected {
            match self.graph.get(id) {
                None => {
                    warn!(task = %id, "overdue batch names an unknown task");
                    warnings.push(StaleReference::Task(id));
                }
                Some(task) if !task.is_overdue() => {
                    warn!(task = %id, due = ?task.due, "task is not overdue; skipped");
                }
                Some(task) if task.earliest_start > 0 => {
                    warn!(task = %id, earliest = task.earliest_start, "overdue task cannot start today; skipped");
                }
                Some(_) => {
                    batch.insert(id);
                }
            }
        }

        let mut persist = Vec::new();
        for &id in &batch {
            self.graph.record_completion(id, 0);
            self.persist_changed(EntityRef::Task(id), &mut persist);
        }

        let outcome = if batch.is_empty() {
            Default::default()
        } else {
            self.reoptimize()
        };
        info!(completed = batch.len(), "overdue batch resolved");

        Ok(MutationReport {
            outcome,
            persist,
            warnings,
        })
    }

    /// Add an event and repair the schedule around it.
    pub fn add_event(&mut self, new: NewEvent) -> Result<(EventId, MutationReport)> {
        let (id, change) = self.calendar.add_event(new)?;
        let mut persist = Vec::new();
        self.persist_new(EntityRef::Event(id), &mut persist);
        let outcome = self.reoptimize();
        info!(event = %id, day = change.day, budget = change.after, "event added");

        Ok((
            id,
            MutationReport {
                outcome,
                persist,
                warnings: Vec::new(),
            },
        ))
    }

    pub fn delete_event(&mut self, id: EventId) -> Result<MutationReport> {
        let Some((event, change)) = self.calendar.remove_event(id) else {
            return Ok(MutationReport::stale(StaleReference::Event(id)));
        };
        let mut persist = Vec::new();
        self.persist_deleted(EntityRef::Event(id), event.store_id, &mut persist);
        let outcome = self.reoptimize();
        info!(event = %id, day = change.day, budget = change.after, "event deleted");

        Ok(MutationReport {
            outcome,
            persist,
            warnings: Vec::new(),
        })
    }

    /// Add `delta` minutes (may be negative) to today's consumed time.
    pub fn adjust_today_time(&mut self, delta: Minutes) -> MutationReport {
        let consumed = self.calendar.today_consumed().saturating_add(delta);
        self.set_today_time(consumed)
    }

    /// Overwrite today's consumed time. Negative values clamp to zero.
    pub fn set_today_time(&mut self, minutes: Minutes) -> MutationReport {
        let change = self.calendar.set_today_consumed(minutes);
        let persist = vec![PersistCommand::SaveSession(self.session_record())];
        let outcome = if change.before == change.after {
            Default::default()
        } else {
            self.reoptimize()
        };
        info!(today_minutes = self.calendar.today_consumed(), "today time set");

        MutationReport {
            outcome,
            persist,
            warnings: Vec::new(),
        }
    }

    pub fn add_prerequisite(&mut self, child: TaskId, parent: TaskId) -> Result<MutationReport> {
        if !self.graph.add_prerequisite(child, parent)? {
            return Ok(MutationReport::default());
        }
        self.edge_changed(child, parent)
    }

    pub fn remove_prerequisite(&mut self, child: TaskId, parent: TaskId) -> Result<MutationReport> {
        if !self.graph.remove_prerequisite(child, parent)? {
            return Ok(MutationReport::default());
        }
        self.edge_changed(child, parent)
    }

    fn edge_changed(&mut self, child: TaskId, parent: TaskId) -> Result<MutationReport> {
        let mut persist = Vec::new();
        self.persist_changed(EntityRef::Task(child), &mut persist);
        self.persist_changed(EntityRef::Task(parent), &mut persist);
        let outcome = self.reoptimize();
        Ok(MutationReport {
            outcome,
            persist,
            warnings: Vec::new(),
        })
    }

    /// Change or clear the hard deadline.
    pub fn set_due_date(&mut self, id: TaskId, due: Option<Day>) -> Result<MutationReport> {
        let Some(task) = self.graph.get_mut(id) else {
            return Ok(MutationReport::stale(StaleReference::Task(id)));
        };
        task.due = due;
        self.task_edited(id, true)
    }

    pub fn set_duration(&mut self, id: TaskId, minutes: Minutes) -> Result<MutationReport> {
        if minutes < 0 {
            return Err(PlannerError::InvalidInput(format!(
                "duration must be >= 0 (got {minutes})"
            )));
        }
        let Some(task) = self.graph.get_mut(id) else {
            return Ok(MutationReport::stale(StaleReference::Task(id)));
        };
        task.duration = minutes;
        self.task_edited(id, true)
    }

    /// Renaming does not affect the schedule.
    pub fn rename_task(&mut self, id: TaskId, name: &str) -> Result<MutationReport> {
        validate_task_fields(name, 0)?;
        let Some(task) = self.graph.get_mut(id) else {
            return Ok(MutationReport::stale(StaleReference::Task(id)));
        };
        task.name = name.trim().to_string();
        self.task_edited(id, false)
    }

    fn task_edited(&mut self, id: TaskId, reschedule: bool) -> Result<MutationReport> {
        let mut persist = Vec::new();
        self.persist_changed(EntityRef::Task(id), &mut persist);
        let outcome = if reschedule {
            self.reoptimize()
        } else {
            Default::default()
        };
        Ok(MutationReport {
            outcome,
            persist,
            warnings: Vec::new(),
        })
    }
}

fn validate_task_fields(name: &str, duration: Minutes) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PlannerError::InvalidInput("task name must not be empty".to_string()));
    }
    if duration < 0 {
        return Err(PlannerError::InvalidInput(format!(
            "duration must be >= 0 (got {duration})"
        )));
    }
    Ok(())
}
