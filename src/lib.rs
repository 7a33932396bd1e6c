// src/lib.rs

pub mod calendar;
pub mod cli;
pub mod clock;
pub mod config;
pub mod dag;
pub mod errors;
pub mod logging;
pub mod model;
pub mod planner;
pub mod runtime;
pub mod schedule;
pub mod store;
pub mod types;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, TimerCommand};
use crate::clock::{date_at, day_index, Clock, SystemClock};
use crate::config::{default_config_path, load_and_validate, load_or_default};
use crate::model::{NewEvent, NewTask};
use crate::planner::Planner;
use crate::runtime::PlannerRuntime;
use crate::schedule::ScheduleOutcome;
use crate::store::TomlFileStore;
use crate::types::{Day, StoreId, TaskId};

/// High-level entry point used by `main.rs`.
///
/// Loads config and the data file, restores the planner for today, applies
/// one command, prints what changed and flushes the store before returning.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(PathBuf::from(path))
            .with_context(|| format!("loading config {path}"))?,
        None => load_or_default(default_config_path())?,
    };

    let clock = SystemClock;
    let today = clock.today();
    let store = TomlFileStore::new(&cfg.store.path);
    let mut rt = PlannerRuntime::open(store, cfg.planner_settings(), today).await?;
    info!(store = %cfg.store.path.display(), %today, "planner ready");

    let mut added = None;
    match args.command {
        Command::Show { days } => {
            print_schedule(rt.planner(), Day::from(days))?;
        }
        Command::Add {
            name,
            minutes,
            due,
            after,
        } => {
            let parents = after
                .iter()
                .map(|id| task_id(rt.planner(), *id))
                .collect::<Result<Vec<_>>>()?;
            let mut new = NewTask::new(name, minutes);
            new.due = due.map(|d| day_index(today, d));
            let (id, report) = rt.planner_mut().add_task(new, &parents)?;
            let outcome = rt.dispatch(report);
            print_outcome(rt.planner(), &outcome)?;
            added = Some(id);
        }
        Command::Done { id, minutes } => {
            let task = task_id(rt.planner(), id)?;
            let report = rt.planner_mut().complete_task(task, minutes)?;
            let outcome = rt.dispatch(report);
            print_outcome(rt.planner(), &outcome)?;
        }
        Command::Delete { id } => {
            let task = task_id(rt.planner(), id)?;
            let report = rt.planner_mut().delete_task(task)?;
            let outcome = rt.dispatch(report);
            print_outcome(rt.planner(), &outcome)?;
        }
        Command::Event {
            name,
            date,
            start,
            end,
        } => {
            let new = NewEvent::new(name, day_index(today, date), start, end);
            let (_, report) = rt.planner_mut().add_event(new)?;
            let outcome = rt.dispatch(report);
            print_outcome(rt.planner(), &outcome)?;
        }
        Command::Unevent { id } => {
            let event = rt
                .planner()
                .event_by_store_id(id)
                .map(|e| e.id)
                .ok_or_else(|| anyhow!("no event with id {id}"))?;
            let report = rt.planner_mut().delete_event(event)?;
            let outcome = rt.dispatch(report);
            print_outcome(rt.planner(), &outcome)?;
        }
        Command::Overdue { done } if done.is_empty() => {
            let planner = rt.planner();
            let overdue = planner.overdue_tasks();
            if overdue.is_empty() {
                println!("no overdue tasks");
            }
            for id in overdue {
                println!("  {}", describe(planner, id)?);
            }
        }
        Command::Overdue { done } => {
            let selected = done
                .iter()
                .map(|id| task_id(rt.planner(), *id))
                .collect::<Result<Vec<_>>>()?;
            let report = rt.planner_mut().mark_overdue_batch(&selected)?;
            let outcome = rt.dispatch(report);
            print_outcome(rt.planner(), &outcome)?;
        }
        Command::Timer(TimerCommand::Start { id }) => {
            let task = task_id(rt.planner(), id)?;
            let (previous, report) = rt.planner_mut().timer_start(task, clock.now());
            rt.dispatch(report);
            if let Some(reading) = previous {
                println!("stopped {} after {}m", describe(rt.planner(), reading.task)?, reading.elapsed);
            }
            println!("timing {}", describe(rt.planner(), task)?);
        }
        Command::Timer(TimerCommand::Stop) => {
            let (reading, report) = rt.planner_mut().timer_stop(clock.now());
            rt.dispatch(report);
            match reading {
                Some(r) => println!("{}: {}m", describe(rt.planner(), r.task)?, r.elapsed),
                None => println!("no timer running"),
            }
        }
    }

    let planner = rt.shutdown().await;
    if let Some(id) = added {
        println!("added {}", describe(&planner, id)?);
    }
    debug!("command complete");
    Ok(())
}

fn task_id(planner: &Planner, id: StoreId) -> Result<TaskId> {
    planner
        .task_by_store_id(id)
        .map(|t| t.id)
        .ok_or_else(|| anyhow!("no task with id {id}"))
}

/// `#<store id> <name> (<minutes>m)`; tasks not yet stored show `#?`.
fn describe(planner: &Planner, id: TaskId) -> Result<String> {
    let task = planner.task(id).ok_or_else(|| anyhow!("unknown task {id}"))?;
    let store_id = task
        .store_id
        .map_or_else(|| "?".to_string(), |s| s.to_string());
    Ok(format!("#{store_id} {} ({}m)", task.name, task.duration))
}

fn print_day(planner: &Planner, day: Day) -> Result<()> {
    let date = date_at(planner.origin(), day)?;
    println!(
        "{date} (budget {}m, free {}m)",
        planner.calendar().budget(day),
        planner.remaining_budget(day)
    );
    for event in planner.calendar().events_on(day) {
        println!(
            "  [{:02}:{:02}-{:02}:{:02}] {}",
            event.start / 60,
            event.start % 60,
            event.end / 60,
            event.end % 60,
            event.name
        );
    }
    for id in planner.completed_on(day) {
        println!("  done {}", describe(planner, id)?);
    }
    for &id in planner.tasks_on(day) {
        println!("  {}", describe(planner, id)?);
    }
    Ok(())
}

fn print_schedule(planner: &Planner, days: Day) -> Result<()> {
    for day in 0..days.max(1) {
        print_day(planner, day)?;
    }
    print_infeasible(planner)
}

fn print_outcome(planner: &Planner, outcome: &ScheduleOutcome) -> Result<()> {
    if outcome.is_unchanged() {
        println!("schedule unchanged");
    }
    for &day in &outcome.changed_days {
        print_day(planner, day)?;
    }
    print_infeasible(planner)
}

fn print_infeasible(planner: &Planner) -> Result<()> {
    for err in planner.infeasible() {
        println!("cannot schedule {}: {:?}", describe(planner, err.task)?, err.reason);
    }
    Ok(())
}
