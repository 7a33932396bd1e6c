// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::GraphError;
use crate::model::{Completion, NewTask, Task};
use crate::types::{Day, TaskId};

/// In-memory task graph keyed by [`TaskId`].
///
/// Edges point from prerequisite (parent) to dependent (child). Every task
/// stores both directions; the two sets are kept as exact inverses of each
/// other. The subgraph induced by incomplete tasks is acyclic: every edge
/// insertion is checked for reachability from the child back to the parent.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: HashMap<TaskId, Task>,
    next_id: u64,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// All tasks in unspecified order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// All task ids in ascending order.
    pub fn ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.tasks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Insert a new task with the given prerequisites.
    ///
    /// Rejects the task (and inserts nothing) if a parent is unknown or an
    /// edge would close a cycle among incomplete tasks.
    pub fn add_task(&mut self, new: NewTask, parents: &[TaskId]) -> Result<TaskId, GraphError> {
        let id = TaskId(self.next_id);

        for &parent in parents {
            if !self.tasks.contains_key(&parent) {
                return Err(GraphError::UnknownTask(parent));
            }
            // Reachability from the new child back to the proposed parent.
            if self.would_close_cycle(id, parent) {
                return Err(GraphError::WouldCycle { child: id, parent });
            }
        }

        self.next_id += 1;
        let mut task = Task::from_new(id, new);
        for &parent in parents {
            task.parents.insert(parent);
            if let Some(p) = self.tasks.get_mut(&parent) {
                p.children.insert(id);
            }
        }
        self.tasks.insert(id, task);
        self.refresh_earliest_start(id);

        debug!(task = %id, ?parents, "task added to graph");
        Ok(id)
    }

    /// Add the edge `parent -> child`. Returns `false` if it already existed.
    pub fn add_prerequisite(&mut self, child: TaskId, parent: TaskId) -> Result<bool, GraphError> {
        let child_task = self.tasks.get(&child).ok_or(GraphError::UnknownTask(child))?;
        if child_task.is_complete() {
            return Err(GraphError::CompletedTask(child));
        }
        self.insert_edge(child, parent)
    }

    /// Edge insertion without the completed-child check, for persisted
    /// history where a finished task keeps its prerequisites.
    pub(crate) fn insert_edge(&mut self, child: TaskId, parent: TaskId) -> Result<bool, GraphError> {
        let child_task = self.tasks.get(&child).ok_or(GraphError::UnknownTask(child))?;
        if !self.tasks.contains_key(&parent) {
            return Err(GraphError::UnknownTask(parent));
        }
        if child == parent {
            return Err(GraphError::SelfDependency(child));
        }
        if child_task.parents.contains(&parent) {
            return Ok(false);
        }
        if self.would_close_cycle(child, parent) {
            return Err(GraphError::WouldCycle { child, parent });
        }

        self.link(child, parent);
        self.refresh_earliest_start(child);
        debug!(child = %child, parent = %parent, "prerequisite added");
        Ok(true)
    }

    /// Remove the edge `parent -> child`. Returns `false` if there was none.
    pub fn remove_prerequisite(&mut self, child: TaskId, parent: TaskId) -> Result<bool, GraphError> {
        let child_task = self.tasks.get_mut(&child).ok_or(GraphError::UnknownTask(child))?;
        if !child_task.parents.remove(&parent) {
            return Ok(false);
        }
        if let Some(p) = self.tasks.get_mut(&parent) {
            p.children.remove(&child);
        }
        self.refresh_earliest_start(child);
        debug!(child = %child, parent = %parent, "prerequisite removed");
        Ok(true)
    }

    /// Remove a task and detach it from all parents and children.
    ///
    /// Children lose this prerequisite; nothing is re-linked. Their earliest
    /// start is recomputed and may decrease.
    pub fn remove_task(&mut self, id: TaskId) -> Result<Task, GraphError> {
        let task = self.tasks.remove(&id).ok_or(GraphError::UnknownTask(id))?;

        for parent in &task.parents {
            if let Some(p) = self.tasks.get_mut(parent) {
                p.children.remove(&id);
            }
        }
        for &child in &task.children {
            if let Some(c) = self.tasks.get_mut(&child) {
                c.parents.remove(&id);
            }
            self.refresh_earliest_start(child);
        }

        debug!(task = %id, children = task.children.len(), "task removed from graph");
        Ok(task)
    }

    /// Mark a task complete on `day`.
    ///
    /// Requires `day >= earliest_start`. Children have their earliest start
    /// raised to at least `day + 1`; the ids whose value changed are returned.
    pub fn mark_complete(&mut self, id: TaskId, day: Day) -> Result<Vec<TaskId>, GraphError> {
        let task = self.tasks.get(&id).ok_or(GraphError::UnknownTask(id))?;
        if task.is_complete() {
            return Err(GraphError::CompletedTask(id));
        }
        if day < task.earliest_start {
            return Err(GraphError::CompletionBeforeEarliestStart {
                task: id,
                day,
                earliest: task.earliest_start,
            });
        }

        Ok(self.set_completion(id, day))
    }

    /// Set the completion state without the earliest-start check. Used for
    /// persisted history and for batches validated up front by the caller.
    pub(crate) fn record_completion(&mut self, id: TaskId, day: Day) -> Vec<TaskId> {
        self.set_completion(id, day)
    }

    fn set_completion(&mut self, id: TaskId, day: Day) -> Vec<TaskId> {
        let children = match self.tasks.get_mut(&id) {
            Some(task) => {
                task.completion = Some(Completion { day });
                task.children.clone()
            }
            None => return Vec::new(),
        };

        children
            .into_iter()
            .filter(|&child| self.refresh_earliest_start(child))
            .collect()
    }

    /// Earliest start implied by `created` and completed prerequisites.
    pub fn compute_earliest_start(&self, id: TaskId) -> Option<Day> {
        let task = self.tasks.get(&id)?;
        let from_parents = task
            .parents
            .iter()
            .filter_map(|p| self.tasks.get(p).and_then(Task::completion_day))
            .map(|d| d + 1)
            .max();
        Some(match from_parents {
            Some(d) => d.max(task.created),
            None => task.created,
        })
    }

    /// Returns `true` if the stored value changed.
    fn refresh_earliest_start(&mut self, id: TaskId) -> bool {
        let Some(earliest) = self.compute_earliest_start(id) else {
            return false;
        };
        match self.tasks.get_mut(&id) {
            Some(task) if task.earliest_start != earliest => {
                debug!(task = %id, from = task.earliest_start, to = earliest, "earliest start changed");
                task.earliest_start = earliest;
                true
            }
            _ => false,
        }
    }

    fn link(&mut self, child: TaskId, parent: TaskId) {
        if let Some(c) = self.tasks.get_mut(&child) {
            c.parents.insert(parent);
        }
        if let Some(p) = self.tasks.get_mut(&parent) {
            p.children.insert(child);
        }
    }

    /// Would adding `parent -> child` close a cycle among incomplete tasks?
    ///
    /// True iff `parent` is reachable from `child` through edges between
    /// incomplete tasks.
    pub fn would_close_cycle(&self, child: TaskId, parent: TaskId) -> bool {
        if child == parent {
            return true;
        }
        let graph = self.incomplete_edges();
        if !graph.contains_node(child) || !graph.contains_node(parent) {
            return false;
        }
        has_path_connecting(&graph, child, parent, None)
    }

    /// Edge view over incomplete tasks, used for reachability queries.
    pub(crate) fn incomplete_edges(&self) -> DiGraphMap<TaskId, ()> {
        let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();
        for task in self.tasks.values().filter(|t| !t.is_complete()) {
            graph.add_node(task.id);
        }
        for task in self.tasks.values().filter(|t| !t.is_complete()) {
            for child in &task.children {
                if graph.contains_node(*child) {
                    graph.add_edge(task.id, *child, ());
                }
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str) -> NewTask {
        NewTask::new(name, 30)
    }

    #[test]
    fn parent_and_child_sets_stay_inverse() {
        let mut g = TaskGraph::new();
        let a = g.add_task(task("a"), &[]).unwrap();
        let b = g.add_task(task("b"), &[a]).unwrap();
        let c = g.add_task(task("c"), &[a, b]).unwrap();

        assert_eq!(g.get(a).unwrap().children.iter().copied().collect::<Vec<_>>(), vec![b, c]);
        assert!(g.get(c).unwrap().parents.contains(&b));

        g.remove_task(b).unwrap();
        assert!(!g.get(a).unwrap().children.contains(&b));
        assert!(!g.get(c).unwrap().parents.contains(&b));
    }

    #[test]
    fn unknown_parent_is_rejected_without_insert() {
        let mut g = TaskGraph::new();
        let err = g.add_task(task("a"), &[TaskId(99)]).unwrap_err();
        assert_eq!(err, GraphError::UnknownTask(TaskId(99)));
        assert!(g.is_empty());
    }

    #[test]
    fn prerequisite_closing_a_cycle_is_rejected() {
        let mut g = TaskGraph::new();
        let a = g.add_task(task("a"), &[]).unwrap();
        let b = g.add_task(task("b"), &[a]).unwrap();
        let c = g.add_task(task("c"), &[b]).unwrap();

        assert_eq!(
            g.add_prerequisite(a, c),
            Err(GraphError::WouldCycle { child: a, parent: c })
        );
        assert_eq!(g.add_prerequisite(a, a), Err(GraphError::SelfDependency(a)));
        assert!(g.get(a).unwrap().parents.is_empty());
    }

    #[test]
    fn completed_tasks_do_not_take_part_in_cycles() {
        let mut g = TaskGraph::new();
        let a = g.add_task(task("a"), &[]).unwrap();
        let b = g.add_task(task("b"), &[a]).unwrap();
        g.mark_complete(b, 0).unwrap();

        // b is complete, so a -> b -> a is not a cycle among incomplete tasks.
        assert!(!g.would_close_cycle(a, b));
    }

    #[test]
    fn completing_parent_raises_child_earliest_start() {
        let mut g = TaskGraph::new();
        let a = g.add_task(task("a"), &[]).unwrap();
        let b = g.add_task(task("b"), &[a]).unwrap();
        assert_eq!(g.get(b).unwrap().earliest_start, 0);

        let changed = g.mark_complete(a, 2).unwrap();
        assert_eq!(changed, vec![b]);
        assert_eq!(g.get(b).unwrap().earliest_start, 3);
    }

    #[test]
    fn completion_before_earliest_start_is_rejected() {
        let mut g = TaskGraph::new();
        let a = g.add_task(task("a").created_on(2), &[]).unwrap();
        assert_eq!(
            g.mark_complete(a, 1),
            Err(GraphError::CompletionBeforeEarliestStart { task: a, day: 1, earliest: 2 })
        );
        assert_eq!(g.mark_complete(a, 2), Ok(vec![]));
        assert_eq!(g.mark_complete(a, 3), Err(GraphError::CompletedTask(a)));
    }

    #[test]
    fn removing_completed_parent_lowers_child_earliest_start() {
        let mut g = TaskGraph::new();
        let a = g.add_task(task("a"), &[]).unwrap();
        let b = g.add_task(task("b"), &[a]).unwrap();
        g.mark_complete(a, 4).unwrap();
        assert_eq!(g.get(b).unwrap().earliest_start, 5);

        g.remove_task(a).unwrap();
        assert_eq!(g.get(b).unwrap().earliest_start, 0);
    }
}
