// src/planner/queries.rs

//! Read-only views used by the UI layer.

use crate::errors::InfeasibleError;
use crate::model::{Event, Label, Project, Task, TaskState};
use crate::planner::Planner;
use crate::types::{Day, EventId, LabelId, Minutes, ProjectId, StoreId, TaskId};

impl Planner {
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.graph.get(id)
    }

    pub fn task_by_store_id(&self, id: StoreId) -> Option<&Task> {
        self.graph.tasks().find(|t| t.store_id == Some(id))
    }

    /// Case-insensitive substring match on task names, in id order.
    pub fn find_by_name(&self, needle: &str) -> Vec<TaskId> {
        let needle = needle.to_lowercase();
        self.graph
            .ids()
            .into_iter()
            .filter(|id| {
                self.graph
                    .get(*id)
                    .is_some_and(|t| t.name.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.calendar.event(id)
    }

    pub fn event_by_store_id(&self, id: StoreId) -> Option<&Event> {
        self.calendar.events().find(|e| e.store_id == Some(id))
    }

    /// Scheduled tasks on `day`, in placement order.
    pub fn tasks_on(&self, day: Day) -> &[TaskId] {
        self.table.tasks_on(day)
    }

    pub fn day_of(&self, task: TaskId) -> Option<Day> {
        self.table.day_of(task)
    }

    /// Tasks completed on `day`, in id order.
    pub fn completed_on(&self, day: Day) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .graph
            .tasks()
            .filter(|t| t.completion_day() == Some(day))
            .map(|t| t.id)
            .collect();
        ids.sort();
        ids
    }

    /// Budget of `day` minus the estimates of the tasks scheduled on it.
    pub fn remaining_budget(&self, day: Day) -> Minutes {
        let used: Minutes = self
            .table
            .tasks_on(day)
            .iter()
            .filter_map(|id| self.graph.get(*id))
            .map(|t| t.duration)
            .sum();
        self.calendar.budget(day) - used
    }

    /// Incomplete tasks whose due day already passed, in id order.
    pub fn overdue_tasks(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .graph
            .tasks()
            .filter(|t| t.is_overdue())
            .map(|t| t.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.get(&id)
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    /// Members of a project in insertion order. Empty for unknown projects.
    pub fn project_members(&self, id: ProjectId) -> Vec<TaskId> {
        self.projects
            .get(&id)
            .map(|p| p.members.clone())
            .unwrap_or_default()
    }

    pub fn label_members(&self, id: LabelId) -> Vec<TaskId> {
        self.labels
            .get(&id)
            .map(|l| l.members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Tasks the last reoptimization could not place.
    pub fn infeasible(&self) -> &[InfeasibleError] {
        &self.infeasible
    }

    pub fn state_of(&self, id: TaskId) -> Option<TaskState> {
        let task = self.graph.get(id)?;
        Some(match (task.completion_day(), self.table.day_of(id)) {
            (Some(day), _) => TaskState::Completed(day),
            (None, Some(day)) => TaskState::Scheduled(day),
            (None, None) => TaskState::Unscheduled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::InfeasibleReason;
    use crate::model::NewTask;
    use crate::planner::test_support::planner;

    #[test]
    fn states_follow_the_table_and_completions() {
        let mut p = planner(60);
        let (a, _) = p.add_task(NewTask::new("a", 60), &[]).unwrap();
        let (b, _) = p.add_task(NewTask::new("b", 60), &[]).unwrap();
        let (c, _) = p.add_task(NewTask::new("c", 30).due(0), &[]).unwrap();

        assert_eq!(p.state_of(c), Some(TaskState::Scheduled(0)));
        assert_eq!(p.state_of(a), Some(TaskState::Scheduled(1)));
        assert_eq!(p.state_of(b), Some(TaskState::Scheduled(2)));

        p.complete_task(c, None).unwrap();
        assert_eq!(p.state_of(c), Some(TaskState::Completed(0)));
        assert_eq!(p.completed_on(0), vec![c]);
        assert_eq!(p.state_of(TaskId(99)), None);
    }

    #[test]
    fn remaining_budget_subtracts_events_and_tasks() {
        let mut p = planner(120);
        p.add_task(NewTask::new("a", 45), &[]).unwrap();
        p.add_event(crate::model::NewEvent::new("standup", 0, 540, 570))
            .unwrap();
        assert_eq!(p.remaining_budget(0), 120 - 30 - 45);
        assert_eq!(p.remaining_budget(1), 120);
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let mut p = planner(480);
        let (a, _) = p.add_task(NewTask::new("Write report", 30), &[]).unwrap();
        p.add_task(NewTask::new("groceries", 30), &[]).unwrap();
        let (c, _) = p.add_task(NewTask::new("review REPORT", 30), &[]).unwrap();
        assert_eq!(p.find_by_name("report"), vec![a, c]);
    }

    #[test]
    fn overdue_and_infeasible_views() {
        let mut p = planner(60);
        let (late, _) = p
            .add_task(NewTask::new("late", 30).created_on(-3).due(-1), &[])
            .unwrap();
        assert_eq!(p.overdue_tasks(), vec![late]);
        assert!(matches!(
            p.infeasible(),
            [InfeasibleError {
                reason: InfeasibleReason::DeadlineMissed { .. },
                ..
            }]
        ));
    }
}
