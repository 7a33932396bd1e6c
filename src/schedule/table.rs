// src/schedule/table.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::schedule::outcome::TaskMove;
use crate::types::{Day, TaskId};

/// Mapping day -> tasks scheduled that day, in placement order.
///
/// Derived state: produced by the scheduler, never edited by collaborators.
/// Only incomplete tasks appear here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayAssignmentTable {
    days: BTreeMap<Day, Vec<TaskId>>,
    placement: HashMap<TaskId, Day>,
}

impl DayAssignmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.placement.is_empty()
    }

    /// Number of scheduled tasks.
    pub fn len(&self) -> usize {
        self.placement.len()
    }

    pub fn tasks_on(&self, day: Day) -> &[TaskId] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn day_of(&self, task: TaskId) -> Option<Day> {
        self.placement.get(&task).copied()
    }

    /// Non-empty days in ascending order.
    pub fn days(&self) -> impl Iterator<Item = (Day, &[TaskId])> {
        self.days.iter().map(|(day, tasks)| (*day, tasks.as_slice()))
    }

    pub(crate) fn assign(&mut self, task: TaskId, day: Day) {
        self.days.entry(day).or_default().push(task);
        self.placement.insert(task, day);
    }

    /// Days whose task list differs between `self` and `next`, plus one move
    /// per task whose day changed (ordered by task id).
    pub fn diff(&self, next: &DayAssignmentTable) -> (BTreeSet<Day>, Vec<TaskMove>) {
        let all_days: BTreeSet<Day> = self.days.keys().chain(next.days.keys()).copied().collect();
        let changed_days = all_days
            .into_iter()
            .filter(|day| self.tasks_on(*day) != next.tasks_on(*day))
            .collect();

        let all_tasks: BTreeSet<TaskId> = self
            .placement
            .keys()
            .chain(next.placement.keys())
            .copied()
            .collect();
        let moves = all_tasks
            .into_iter()
            .filter_map(|task| {
                let from = self.day_of(task);
                let to = next.day_of(task);
                (from != to).then_some(TaskMove { task, from, to })
            })
            .collect();

        (changed_days, moves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_reports_changed_days_and_moves() {
        let mut old = DayAssignmentTable::new();
        old.assign(TaskId(1), 0);
        old.assign(TaskId(2), 0);
        old.assign(TaskId(3), 2);

        let mut new = DayAssignmentTable::new();
        new.assign(TaskId(1), 0);
        new.assign(TaskId(2), 1);
        new.assign(TaskId(4), 2);
        new.assign(TaskId(3), 2);

        let (days, moves) = old.diff(&new);
        assert_eq!(days.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(
            moves,
            vec![
                TaskMove { task: TaskId(2), from: Some(0), to: Some(1) },
                TaskMove { task: TaskId(4), from: None, to: Some(2) },
            ]
        );
    }

    #[test]
    fn identical_tables_have_empty_diff() {
        let mut t = DayAssignmentTable::new();
        t.assign(TaskId(7), 3);
        let (days, moves) = t.diff(&t.clone());
        assert!(days.is_empty());
        assert!(moves.is_empty());
    }
}
