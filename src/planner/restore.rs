// src/planner/restore.rs

//! Rebuild a [`Planner`] from the records a store loaded at startup.

use std::collections::{BTreeSet, HashMap};

use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::clock::{epoch_day_to_index, to_epoch_day};
use crate::errors::Result;
use crate::model::{Label, NewEvent, NewTask, Project};
use crate::planner::{ActiveTimer, Planner, PlannerSettings};
use crate::store::record::{decode_ids, StoreSnapshot, TaskRecord};
use crate::types::{LabelId, ProjectId, StoreId, TaskId};

impl Planner {
    /// Restore a planner whose day 0 is `origin`.
    ///
    /// Task handles are allocated in store-id order. Records without a store
    /// id are skipped. Unparsable ids in delimited lists, edges to unknown
    /// tasks and edges that would close a cycle among incomplete tasks are
    /// dropped with a warning. Negative durations are read as zero. Today's consumed time is kept only when the session belongs
    /// to `origin`. One reoptimization runs before returning.
    pub fn restore(settings: PlannerSettings, origin: Date, snapshot: StoreSnapshot) -> Result<Self> {
        let mut planner = Planner::new(settings, origin);

        let mut project_ids: HashMap<StoreId, ProjectId> = HashMap::new();
        for record in &snapshot.projects {
            let Some(store_id) = record.id else {
                warn!(name = %record.name, "project record without id skipped");
                continue;
            };
            let id = ProjectId(planner.next_project);
            planner.next_project += 1;
            planner.projects.insert(
                id,
                Project {
                    id,
                    store_id: Some(store_id),
                    name: record.name.clone(),
                    members: Vec::new(),
                },
            );
            project_ids.insert(store_id, id);
        }

        let mut label_ids: HashMap<StoreId, LabelId> = HashMap::new();
        for record in &snapshot.labels {
            let Some(store_id) = record.id else {
                warn!(name = %record.name, "label record without id skipped");
                continue;
            };
            let id = LabelId(planner.next_label);
            planner.next_label += 1;
            planner.labels.insert(
                id,
                Label {
                    id,
                    store_id: Some(store_id),
                    name: record.name.clone(),
                    members: BTreeSet::new(),
                },
            );
            label_ids.insert(store_id, id);
        }

        // Handles follow store ids, so the scheduler's id tie-break does not
        // depend on the order the store returned the records in.
        let mut records: Vec<&TaskRecord> = snapshot.tasks.iter().collect();
        records.sort_by_key(|r| r.id);

        let mut task_ids: HashMap<StoreId, TaskId> = HashMap::new();
        let mut restored: Vec<(TaskId, &TaskRecord)> = Vec::new();
        for record in records {
            let Some(store_id) = record.id else {
                warn!(name = %record.name, "task record without id skipped");
                continue;
            };
            let duration = if record.duration_minutes < 0 {
                warn!(store_id = %store_id, duration = record.duration_minutes, "negative duration read as 0");
                0
            } else {
                record.duration_minutes
            };
            let mut new = NewTask::new(record.name.clone(), duration)
                .created_on(epoch_day_to_index(origin, record.created_epoch_day));
            new.due = record.due_epoch_day.map(|d| epoch_day_to_index(origin, d));
            new.project = record.project.and_then(|p| project_ids.get(&p).copied());
            new.labels = decode_ids(&record.labels)
                .into_iter()
                .filter_map(|l| label_ids.get(&l).copied())
                .collect();

            let id = planner.graph.add_task(new, &[])?;
            if let Some(task) = planner.graph.get_mut(id) {
                task.store_id = Some(store_id);
                task.actual_minutes = record.actual_minutes;
                task.tracked_minutes = record.tracked_minutes;
            }
            task_ids.insert(store_id, id);
            restored.push((id, record));
        }

        // Completions go first so that cycle checks only see incomplete tasks.
        for (id, record) in &restored {
            if let Some(epoch_day) = record.completed_epoch_day {
                planner
                    .graph
                    .record_completion(*id, epoch_day_to_index(origin, epoch_day));
            }
        }

        for (child, record) in &restored {
            for parent in decode_ids(&record.parents) {
                planner.restore_edge(&task_ids, *child, parent);
            }
        }
        // The children lists carry the same edges from the other side.
        for (parent, record) in &restored {
            for child in decode_ids(&record.children) {
                let Some(parent_store_id) = planner.graph.get(*parent).and_then(|t| t.store_id) else {
                    continue;
                };
                match task_ids.get(&child) {
                    Some(child) => planner.restore_edge(&task_ids, *child, parent_store_id),
                    None => warn!(task = %parent, child = %child, "unknown child pruned"),
                }
            }
        }

        planner.restore_memberships(&snapshot, &project_ids, &label_ids, &task_ids);

        for record in &snapshot.events {
            let Some(store_id) = record.id else {
                warn!(name = %record.name, "event record without id skipped");
                continue;
            };
            let new = NewEvent::new(
                record.name.clone(),
                epoch_day_to_index(origin, record.epoch_day),
                record.start_minute,
                record.end_minute,
            );
            match planner.calendar.add_event(new) {
                Ok((id, _)) => {
                    if let Some(event) = planner.calendar.event_mut(id) {
                        event.store_id = Some(store_id);
                    }
                }
                Err(e) => warn!(store_id = %store_id, error = %e, "invalid event record skipped"),
            }
        }

        if let Some(session) = &snapshot.session {
            if session.epoch_day == to_epoch_day(origin) {
                planner.calendar.set_today_consumed(session.today_minutes);
            }
            planner.timer = match (session.timer_task, session.timer_started_unix) {
                (Some(task), Some(unix)) => {
                    match (task_ids.get(&task), OffsetDateTime::from_unix_timestamp(unix)) {
                        (Some(&task), Ok(started_at)) => Some(ActiveTimer { task, started_at }),
                        _ => {
                            warn!(task = %task, unix, "timer record dropped");
                            None
                        }
                    }
                }
                _ => None,
            };
        }

        planner.reoptimize();
        info!(
            tasks = planner.graph.len(),
            events = snapshot.events.len(),
            infeasible = planner.infeasible.len(),
            "planner restored"
        );
        Ok(planner)
    }

    fn restore_edge(&mut self, task_ids: &HashMap<StoreId, TaskId>, child: TaskId, parent: StoreId) {
        let Some(&parent_id) = task_ids.get(&parent) else {
            warn!(task = %child, parent = %parent, "unknown prerequisite pruned");
            return;
        };
        if let Err(e) = self.graph.insert_edge(child, parent_id) {
            warn!(task = %child, parent = %parent_id, error = %e, "prerequisite dropped");
        }
    }

    /// Members come from both sides of the relation: the group's member list
    /// (which fixes display order) and each task's own project and labels.
    fn restore_memberships(
        &mut self,
        snapshot: &StoreSnapshot,
        project_ids: &HashMap<StoreId, ProjectId>,
        label_ids: &HashMap<StoreId, LabelId>,
        task_ids: &HashMap<StoreId, TaskId>,
    ) {
        for record in &snapshot.projects {
            let Some(&project) = record.id.and_then(|id| project_ids.get(&id)) else {
                continue;
            };
            for member in decode_ids(&record.members) {
                let Some(&task) = task_ids.get(&member) else { continue };
                if let Some(t) = self.graph.get_mut(task) {
                    if t.project.is_none() {
                        t.project = Some(project);
                    }
                }
            }
        }
        for record in &snapshot.labels {
            let Some(&label) = record.id.and_then(|id| label_ids.get(&id)) else {
                continue;
            };
            for member in decode_ids(&record.members) {
                if let Some(t) = task_ids.get(&member).and_then(|&t| self.graph.get_mut(t)) {
                    t.labels.insert(label);
                }
            }
        }

        // Listed members first, in the project's order; the rest by task id.
        let mut listed: HashMap<ProjectId, Vec<TaskId>> = HashMap::new();
        for record in &snapshot.projects {
            let Some(&project) = record.id.and_then(|id| project_ids.get(&id)) else {
                continue;
            };
            let order = decode_ids(&record.members)
                .into_iter()
                .filter_map(|m| task_ids.get(&m).copied())
                .collect();
            listed.insert(project, order);
        }
        for task in self.graph.tasks() {
            for label in &task.labels {
                if let Some(l) = self.labels.get_mut(label) {
                    l.members.insert(task.id);
                }
            }
        }
        for (project_id, project) in self.projects.iter_mut() {
            let mut members: Vec<TaskId> = listed
                .remove(project_id)
                .unwrap_or_default()
                .into_iter()
                .filter(|t| self.graph.get(*t).is_some_and(|t| t.project == Some(*project_id)))
                .collect();
            for id in self.graph.ids() {
                let belongs = self.graph.get(id).is_some_and(|t| t.project == Some(*project_id));
                if belongs && !members.contains(&id) {
                    members.push(id);
                }
            }
            project.members = members;
        }
    }
}
