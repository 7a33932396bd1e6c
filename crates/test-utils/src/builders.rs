#![allow(dead_code)]

use std::collections::BTreeMap;

use dayplan::config::{ConfigFile, PlannerSection, RawConfigFile, StoreSection};
use dayplan::model::{NewEvent, NewTask};
use dayplan::planner::{Planner, PlannerSettings};
use dayplan::types::{Day, Minutes, TaskId};
use time::Date;
use time::macros::date;

/// Day 0 used by tests unless overridden.
pub const TEST_ORIGIN: Date = date!(2025 - 06 - 02);

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                planner: PlannerSection::default(),
                store: StoreSection::default(),
            },
        }
    }

    pub fn daily_minutes(mut self, minutes: Minutes) -> Self {
        self.config.planner.daily_minutes = minutes;
        self
    }

    pub fn horizon_days(mut self, days: u32) -> Self {
        self.config.planner.horizon_days = days;
        self
    }

    pub fn store_path(mut self, path: &str) -> Self {
        self.config.store.path = path.into();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one task of a [`PlannerBuilder`]. Prerequisites are named.
#[derive(Clone)]
pub struct TaskSpec {
    name: String,
    minutes: Minutes,
    due: Option<Day>,
    created: Day,
    after: Vec<String>,
}

impl TaskSpec {
    pub fn new(name: &str, minutes: Minutes) -> Self {
        Self {
            name: name.to_string(),
            minutes,
            due: None,
            created: 0,
            after: vec![],
        }
    }

    pub fn due(mut self, day: Day) -> Self {
        self.due = Some(day);
        self
    }

    pub fn created(mut self, day: Day) -> Self {
        self.created = day;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.after.push(dep.to_string());
        self
    }
}

/// Planner plus the ids of its tasks by name.
pub struct BuiltPlanner {
    pub planner: Planner,
    pub ids: BTreeMap<String, TaskId>,
}

impl BuiltPlanner {
    pub fn id(&self, name: &str) -> TaskId {
        self.ids[name]
    }

    pub fn day_of(&self, name: &str) -> Option<Day> {
        self.planner.day_of(self.id(name))
    }

    /// Task names scheduled on `day`, in placement order.
    pub fn names_on(&self, day: Day) -> Vec<String> {
        self.planner
            .tasks_on(day)
            .iter()
            .filter_map(|id| self.planner.task(*id))
            .map(|t| t.name.clone())
            .collect()
    }
}

/// Builds a [`Planner`] through the public mutation protocol.
///
/// Tasks are added in declaration order, so prerequisites must be declared
/// before their dependents.
pub struct PlannerBuilder {
    settings: PlannerSettings,
    origin: Date,
    tasks: Vec<TaskSpec>,
    events: Vec<NewEvent>,
    today_minutes: Minutes,
}

impl PlannerBuilder {
    pub fn new() -> Self {
        Self {
            settings: PlannerSettings {
                daily_minutes: 480,
                horizon_days: 30,
            },
            origin: TEST_ORIGIN,
            tasks: vec![],
            events: vec![],
            today_minutes: 0,
        }
    }

    pub fn daily_minutes(mut self, minutes: Minutes) -> Self {
        self.settings.daily_minutes = minutes;
        self
    }

    pub fn horizon_days(mut self, days: u32) -> Self {
        self.settings.horizon_days = days;
        self
    }

    pub fn origin(mut self, origin: Date) -> Self {
        self.origin = origin;
        self
    }

    pub fn task(mut self, spec: TaskSpec) -> Self {
        self.tasks.push(spec);
        self
    }

    pub fn event(mut self, name: &str, day: Day, start: Minutes, end: Minutes) -> Self {
        self.events.push(NewEvent::new(name, day, start, end));
        self
    }

    pub fn today_minutes(mut self, minutes: Minutes) -> Self {
        self.today_minutes = minutes;
        self
    }

    pub fn build(self) -> BuiltPlanner {
        let mut planner = Planner::new(self.settings, self.origin);
        let mut ids = BTreeMap::new();

        for event in self.events {
            planner.add_event(event).expect("builder event must be valid");
        }
        if self.today_minutes != 0 {
            planner.set_today_time(self.today_minutes);
        }
        for spec in self.tasks {
            let parents: Vec<TaskId> = spec
                .after
                .iter()
                .map(|name| *ids.get(name).unwrap_or_else(|| panic!("unknown prerequisite {name}")))
                .collect();
            let mut new = NewTask::new(spec.name.clone(), spec.minutes).created_on(spec.created);
            new.due = spec.due;
            let (id, _) = planner
                .add_task(new, &parents)
                .expect("builder task must be valid");
            ids.insert(spec.name, id);
        }

        BuiltPlanner { planner, ids }
    }
}

impl Default for PlannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
