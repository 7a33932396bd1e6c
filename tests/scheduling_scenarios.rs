// tests/scheduling_scenarios.rs

use dayplan::errors::{InfeasibleError, InfeasibleReason};
use dayplan::model::{NewEvent, NewTask, TaskState};
use dayplan::types::TaskId;
use dayplan_test_utils::builders::{PlannerBuilder, TaskSpec};
use dayplan_test_utils::init_tracing;

#[test]
fn chain_with_hour_budget_spreads_over_two_days() {
    init_tracing();
    let built = PlannerBuilder::new()
        .daily_minutes(60)
        .task(TaskSpec::new("A", 60).due(2))
        .task(TaskSpec::new("B", 60).due(3).after("A"))
        .build();

    assert_eq!(built.day_of("A"), Some(0));
    assert_eq!(built.day_of("B"), Some(1));
    assert!(built.planner.infeasible().is_empty());
}

#[test]
fn child_due_before_parent_slot_is_reported_and_parent_stays() {
    init_tracing();
    let built = PlannerBuilder::new()
        .daily_minutes(60)
        .task(TaskSpec::new("A", 60).due(2))
        .task(TaskSpec::new("B", 60).due(0).after("A"))
        .build();

    let b = built.id("B");
    assert_eq!(built.day_of("A"), Some(0));
    assert_eq!(built.planner.state_of(b), Some(TaskState::Unscheduled));
    assert_eq!(
        built.planner.infeasible(),
        &[InfeasibleError {
            task: b,
            reason: InfeasibleReason::DeadlineMissed { due: 0, earliest: 1 },
        }]
    );
}

#[test]
fn full_day_event_pushes_task_to_next_day() {
    init_tracing();
    let built = PlannerBuilder::new()
        .daily_minutes(60)
        .event("workshop", 0, 9 * 60, 10 * 60)
        .task(TaskSpec::new("C", 30).due(1))
        .build();

    assert_eq!(built.planner.calendar().budget(0), 0);
    assert_eq!(built.day_of("C"), Some(1));
}

#[test]
fn adding_an_event_later_repairs_the_schedule() {
    init_tracing();
    let mut built = PlannerBuilder::new()
        .daily_minutes(60)
        .task(TaskSpec::new("C", 30).due(1))
        .build();
    assert_eq!(built.day_of("C"), Some(0));

    let (_, report) = built
        .planner
        .add_event(NewEvent::new("workshop", 0, 540, 600))
        .unwrap();

    assert_eq!(built.day_of("C"), Some(1));
    assert!(report.outcome.changed_days.contains(&0));
    assert!(report.outcome.changed_days.contains(&1));
}

#[test]
fn overrunning_completion_pushes_remaining_work_to_tomorrow() {
    init_tracing();
    let mut built = PlannerBuilder::new()
        .daily_minutes(60)
        .task(TaskSpec::new("A", 40).due(0))
        .task(TaskSpec::new("D", 20))
        .build();
    assert_eq!(built.day_of("D"), Some(0));

    let a = built.id("A");
    let report = built.planner.complete_task(a, Some(80)).unwrap();

    assert_eq!(built.planner.calendar().today_consumed(), 80);
    assert!(built.planner.calendar().budget(0) < 0);
    assert_eq!(built.day_of("D"), Some(1));
    let moved = report
        .outcome
        .moves
        .iter()
        .find(|m| m.task == built.id("D"))
        .unwrap();
    assert_eq!((moved.from, moved.to), (Some(0), Some(1)));
}

#[test]
fn child_stays_after_its_parents_completion_day() {
    init_tracing();
    let mut built = PlannerBuilder::new()
        .daily_minutes(120)
        .task(TaskSpec::new("A", 30))
        .task(TaskSpec::new("B", 30).after("A"))
        .build();
    assert_eq!(built.day_of("B"), Some(1));

    let a = built.id("A");
    built.planner.complete_task(a, None).unwrap();

    let b = built.planner.task(built.id("B")).unwrap();
    assert_eq!(b.earliest_start, 1);
    assert_eq!(built.day_of("B"), Some(1));
}

#[test]
fn cycle_and_unknown_parent_are_rejected_without_insertion() {
    init_tracing();
    let mut built = PlannerBuilder::new()
        .task(TaskSpec::new("A", 30))
        .task(TaskSpec::new("B", 30).after("A"))
        .build();
    let before = built.planner.graph().len();

    let err = built
        .planner
        .add_task(NewTask::new("X", 10), &[TaskId(999)])
        .unwrap_err();
    assert!(err.to_string().contains("task#999"));

    let (a, b) = (built.id("A"), built.id("B"));
    assert!(built.planner.add_prerequisite(a, b).is_err());
    assert_eq!(built.planner.graph().len(), before);
    assert!(!built.planner.task(a).unwrap().parents.contains(&b));
}

#[test]
fn overdue_batch_completes_only_selected_tasks() {
    init_tracing();
    let mut built = PlannerBuilder::new()
        .daily_minutes(120)
        .task(TaskSpec::new("late-done", 30).created(-4).due(-2))
        .task(TaskSpec::new("late-open", 30).created(-4).due(-1))
        .task(TaskSpec::new("next", 30).after("late-done"))
        .build();

    let overdue = built.planner.overdue_tasks();
    assert_eq!(overdue, vec![built.id("late-done"), built.id("late-open")]);

    let report = built
        .planner
        .mark_overdue_batch(&[built.id("late-done")])
        .unwrap();

    assert_eq!(
        built.planner.state_of(built.id("late-done")),
        Some(TaskState::Completed(0))
    );
    assert_eq!(built.planner.overdue_tasks(), vec![built.id("late-open")]);
    assert_eq!(built.day_of("next"), Some(1));
    assert!(report.warnings.is_empty());
}

#[test]
fn deleting_twice_is_a_stale_no_op() {
    init_tracing();
    let mut built = PlannerBuilder::new().task(TaskSpec::new("A", 30)).build();
    let a = built.id("A");

    built.planner.delete_task(a).unwrap();
    let report = built.planner.delete_task(a).unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(report.outcome.is_unchanged());
    assert!(report.persist.is_empty());
}
