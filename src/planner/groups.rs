// src/planner/groups.rs

//! Projects and labels. Cosmetic grouping: none of these mutations
//! reoptimize.

use std::collections::BTreeSet;

use tracing::info;

use crate::errors::{PlannerError, Result, StaleReference};
use crate::model::{Label, Project};
use crate::planner::{MutationReport, Planner};
use crate::types::{EntityRef, LabelId, ProjectId, TaskId};

impl Planner {
    pub fn add_project(&mut self, name: &str) -> Result<(ProjectId, MutationReport)> {
        let name = non_empty(name, "project")?;
        let id = ProjectId(self.next_project);
        self.next_project += 1;
        self.projects.insert(
            id,
            Project {
                id,
                store_id: None,
                name,
                members: Vec::new(),
            },
        );

        let mut report = MutationReport::default();
        self.persist_new(EntityRef::Project(id), &mut report.persist);
        info!(project = %id, "project added");
        Ok((id, report))
    }

    /// Delete a project. Member tasks stay, without a project.
    pub fn delete_project(&mut self, id: ProjectId) -> MutationReport {
        let Some(project) = self.projects.remove(&id) else {
            return MutationReport::stale(StaleReference::Project(id));
        };

        let mut report = MutationReport::default();
        self.persist_deleted(EntityRef::Project(id), project.store_id, &mut report.persist);
        for member in project.members {
            if let Some(task) = self.graph.get_mut(member) {
                task.project = None;
                self.persist_changed(EntityRef::Task(member), &mut report.persist);
            }
        }
        info!(project = %id, "project deleted");
        report
    }

    pub fn add_label(&mut self, name: &str) -> Result<(LabelId, MutationReport)> {
        let name = non_empty(name, "label")?;
        let id = LabelId(self.next_label);
        self.next_label += 1;
        self.labels.insert(
            id,
            Label {
                id,
                store_id: None,
                name,
                members: BTreeSet::new(),
            },
        );

        let mut report = MutationReport::default();
        self.persist_new(EntityRef::Label(id), &mut report.persist);
        info!(label = %id, "label added");
        Ok((id, report))
    }

    /// Delete a label and untag its members.
    pub fn delete_label(&mut self, id: LabelId) -> MutationReport {
        let Some(label) = self.labels.remove(&id) else {
            return MutationReport::stale(StaleReference::Label(id));
        };

        let mut report = MutationReport::default();
        self.persist_deleted(EntityRef::Label(id), label.store_id, &mut report.persist);
        for member in label.members {
            if let Some(task) = self.graph.get_mut(member) {
                task.labels.remove(&id);
                self.persist_changed(EntityRef::Task(member), &mut report.persist);
            }
        }
        info!(label = %id, "label deleted");
        report
    }

    /// Move a task into `project` (appended to its member list), or out of
    /// any project with `None`.
    pub fn assign_project(&mut self, task: TaskId, project: Option<ProjectId>) -> MutationReport {
        let Some(current) = self.graph.get(task).map(|t| t.project) else {
            return MutationReport::stale(StaleReference::Task(task));
        };
        if let Some(p) = project.filter(|p| !self.projects.contains_key(p)) {
            return MutationReport::stale(StaleReference::Project(p));
        }
        if current == project {
            return MutationReport::default();
        }

        let mut report = MutationReport::default();
        if let Some(old) = current.and_then(|p| self.projects.get_mut(&p)) {
            old.members.retain(|m| *m != task);
            let old_id = old.id;
            self.persist_changed(EntityRef::Project(old_id), &mut report.persist);
        }
        if let Some(new) = project.and_then(|p| self.projects.get_mut(&p)) {
            new.members.push(task);
            let new_id = new.id;
            self.persist_changed(EntityRef::Project(new_id), &mut report.persist);
        }
        if let Some(t) = self.graph.get_mut(task) {
            t.project = project;
        }
        self.persist_changed(EntityRef::Task(task), &mut report.persist);
        report
    }

    pub fn tag_task(&mut self, task: TaskId, label: LabelId) -> MutationReport {
        self.set_tag(task, label, true)
    }

    pub fn untag_task(&mut self, task: TaskId, label: LabelId) -> MutationReport {
        self.set_tag(task, label, false)
    }

    fn set_tag(&mut self, task: TaskId, label: LabelId, tagged: bool) -> MutationReport {
        if !self.graph.contains(task) {
            return MutationReport::stale(StaleReference::Task(task));
        }
        let Some(l) = self.labels.get_mut(&label) else {
            return MutationReport::stale(StaleReference::Label(label));
        };
        let changed = if tagged {
            l.members.insert(task)
        } else {
            l.members.remove(&task)
        };
        if !changed {
            return MutationReport::default();
        }
        if let Some(t) = self.graph.get_mut(task) {
            if tagged {
                t.labels.insert(label);
            } else {
                t.labels.remove(&label);
            }
        }

        let mut report = MutationReport::default();
        self.persist_changed(EntityRef::Label(label), &mut report.persist);
        self.persist_changed(EntityRef::Task(task), &mut report.persist);
        report
    }
}

fn non_empty(name: &str, what: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlannerError::InvalidInput(format!("{what} name must not be empty")));
    }
    Ok(name.to_string())
}
