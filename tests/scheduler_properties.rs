// tests/scheduler_properties.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use proptest::prelude::*;

use dayplan::clock::to_epoch_day;
use dayplan::model::{NewEvent, NewTask};
use dayplan::planner::{Planner, PlannerSettings};
use dayplan::store::record::encode_ids;
use dayplan::store::{StoreSnapshot, TaskRecord};
use dayplan::types::{Day, Minutes, StoreId, TaskId};
use dayplan_test_utils::builders::TEST_ORIGIN;

#[derive(Debug, Clone)]
struct TaskShape {
    duration: Minutes,
    due: Option<Day>,
    parents: BTreeSet<usize>,
}

// Acyclic by construction: task i only depends on tasks 0..i.
fn shapes_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<TaskShape>> {
    proptest::collection::vec(
        (
            10..=120i64,
            proptest::option::of(0..10i64),
            proptest::collection::vec(any::<usize>(), 0..3),
        ),
        1..=max_tasks,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (duration, due, deps))| TaskShape {
                duration,
                due,
                parents: if i == 0 {
                    BTreeSet::new()
                } else {
                    deps.into_iter().map(|d| d % i).collect()
                },
            })
            .collect()
    })
}

fn settings(daily_minutes: Minutes) -> PlannerSettings {
    PlannerSettings {
        daily_minutes,
        horizon_days: 20,
    }
}

fn build(shapes: &[TaskShape], daily_minutes: Minutes) -> (Planner, Vec<TaskId>) {
    let mut planner = Planner::new(settings(daily_minutes), TEST_ORIGIN);
    let mut ids = Vec::new();
    for (i, shape) in shapes.iter().enumerate() {
        let mut new = NewTask::new(format!("t{i}"), shape.duration);
        new.due = shape.due;
        let parents: Vec<TaskId> = shape.parents.iter().map(|p| ids[*p]).collect();
        let (id, _) = planner.add_task(new, &parents).unwrap();
        ids.push(id);
    }
    (planner, ids)
}

// (day, start minute, length) with 0 <= start < end <= 1440.
fn events_strategy() -> impl Strategy<Value = Vec<(Day, Minutes, Minutes)>> {
    proptest::collection::vec((0..8i64, 0..1380i64, 15..=180i64), 0..6)
}

fn block_time(planner: &mut Planner, events: &[(Day, Minutes, Minutes)], today: Minutes) {
    for (i, &(day, start, len)) in events.iter().enumerate() {
        let end = (start + len).min(1440);
        planner
            .add_event(NewEvent::new(format!("e{i}"), day, start, end))
            .unwrap();
    }
    planner.set_today_time(today);
}

fn incomplete_graph(planner: &Planner) -> DiGraphMap<TaskId, ()> {
    let mut graph = DiGraphMap::new();
    for task in planner.graph().tasks().filter(|t| !t.is_complete()) {
        graph.add_node(task.id);
        for parent in &task.parents {
            if planner.task(*parent).is_some_and(|p| !p.is_complete()) {
                graph.add_edge(*parent, task.id, ());
            }
        }
    }
    graph
}

fn records(shapes: &[TaskShape]) -> Vec<TaskRecord> {
    let origin = to_epoch_day(TEST_ORIGIN);
    shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| TaskRecord {
            id: Some(StoreId(i as i64 + 1)),
            name: format!("t{i}"),
            duration_minutes: shape.duration,
            created_epoch_day: origin,
            due_epoch_day: shape.due.map(|d| origin + d),
            parents: encode_ids(shape.parents.iter().map(|p| StoreId(*p as i64 + 1))),
            children: String::new(),
            completed_epoch_day: None,
            actual_minutes: None,
            tracked_minutes: 0,
            project: None,
            labels: String::new(),
        })
        .collect()
}

/// Day -> store ids, in placement order.
fn table_by_store_id(planner: &Planner) -> BTreeMap<Day, Vec<StoreId>> {
    planner
        .table()
        .days()
        .map(|(day, ids)| {
            let ids = ids
                .iter()
                .filter_map(|id| planner.task(*id).and_then(|t| t.store_id))
                .collect();
            (day, ids)
        })
        .collect()
}

proptest! {
    #[test]
    fn accepted_edges_keep_incomplete_graph_acyclic(
        shapes in shapes_strategy(10),
        extra in proptest::collection::vec((any::<usize>(), any::<usize>()), 0..20),
    ) {
        let (mut planner, ids) = build(&shapes, 240);
        for (c, p) in extra {
            let (child, parent) = (ids[c % ids.len()], ids[p % ids.len()]);
            let _ = planner.add_prerequisite(child, parent);
        }
        prop_assert!(toposort(&incomplete_graph(&planner), None).is_ok());
    }

    #[test]
    fn scheduled_tasks_respect_budget_start_due_and_order(
        shapes in shapes_strategy(12),
        daily in 60..=240i64,
        events in events_strategy(),
        today in 0..=300i64,
    ) {
        let (mut planner, _) = build(&shapes, daily);
        block_time(&mut planner, &events, today);

        for (day, ids) in planner.table().days() {
            let used: Minutes = ids.iter().map(|id| planner.task(*id).unwrap().duration).sum();
            prop_assert!(used <= planner.calendar().budget(day));

            for id in ids {
                let task = planner.task(*id).unwrap();
                prop_assert!(day >= task.earliest_start.max(0));
                if let Some(due) = task.due {
                    prop_assert!(day <= due);
                }
                for parent in &task.parents {
                    let parent_day = planner.day_of(*parent);
                    prop_assert!(parent_day.is_some_and(|d| d < day));
                }
            }
        }

        let infeasible: BTreeSet<TaskId> = planner.infeasible().iter().map(|e| e.task).collect();
        for task in planner.graph().tasks() {
            prop_assert_eq!(planner.day_of(task.id).is_none(), infeasible.contains(&task.id));
        }
    }

    #[test]
    fn reoptimizing_twice_is_idempotent(shapes in shapes_strategy(12), daily in 30..=240i64) {
        let (mut planner, _) = build(&shapes, daily);
        let before = planner.table().clone();

        let first = planner.reoptimize();
        let second = planner.reoptimize();

        prop_assert!(first.is_unchanged());
        prop_assert!(second.is_unchanged());
        prop_assert_eq!(planner.table(), &before);
    }

    #[test]
    fn record_order_does_not_change_the_schedule(
        (shapes, shuffled) in shapes_strategy(10).prop_flat_map(|shapes| {
            let recs = records(&shapes);
            (Just(shapes), Just(recs).prop_shuffle())
        }),
        daily in 60..=240i64,
    ) {
        let ordered = StoreSnapshot { tasks: records(&shapes), ..StoreSnapshot::default() };
        let shuffled = StoreSnapshot { tasks: shuffled, ..StoreSnapshot::default() };

        let a = Planner::restore(settings(daily), TEST_ORIGIN, ordered).unwrap();
        let b = Planner::restore(settings(daily), TEST_ORIGIN, shuffled).unwrap();

        prop_assert_eq!(table_by_store_id(&a), table_by_store_id(&b));
    }

    #[test]
    fn completing_a_parent_never_lowers_child_earliest_start(
        shapes in shapes_strategy(10),
        pick in any::<usize>(),
    ) {
        let (mut planner, ids) = build(&shapes, 240);
        let parent = ids[pick % ids.len()];
        planner.complete_task(parent, None).unwrap();

        let children = planner.task(parent).unwrap().children.clone();
        for child in children {
            prop_assert!(planner.task(child).unwrap().earliest_start >= 1);
        }
    }
}
