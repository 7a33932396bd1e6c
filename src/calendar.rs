// src/calendar.rs

//! Temporal calendar: per-day time budgets and fixed events.
//!
//! `budget(day) = nominal - Σ event durations on day - (day == 0 ? today_consumed : 0)`
//!
//! Days are unbounded and implicit; a day with no events simply has the
//! nominal budget.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::errors::Result;
use crate::model::{Event, NewEvent};
use crate::types::{Day, EventId, Minutes};

/// Budget of a single day before and after a calendar change.
///
/// The scheduler must repair `day` whenever `after < before`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetChange {
    pub day: Day,
    pub before: Minutes,
    pub after: Minutes,
}

impl BudgetChange {
    pub fn shrank(&self) -> bool {
        self.after < self.before
    }
}

#[derive(Debug, Clone)]
pub struct Calendar {
    nominal_daily: Minutes,
    today_consumed: Minutes,
    events: HashMap<EventId, Event>,
    by_day: BTreeMap<Day, BTreeSet<EventId>>,
    next_id: u64,
}

impl Calendar {
    pub fn new(nominal_daily: Minutes) -> Self {
        Self {
            nominal_daily,
            today_consumed: 0,
            events: HashMap::new(),
            by_day: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn nominal_daily(&self) -> Minutes {
        self.nominal_daily
    }

    pub fn today_consumed(&self) -> Minutes {
        self.today_consumed
    }

    /// Time available to tasks on `day`. May be negative for today when more
    /// time was spent than the nominal budget.
    pub fn budget(&self, day: Day) -> Minutes {
        let today = if day == 0 { self.today_consumed } else { 0 };
        self.nominal_daily
            .saturating_sub(self.event_minutes(day))
            .saturating_sub(today)
    }

    /// Total minutes blocked by events on `day`.
    pub fn event_minutes(&self, day: Day) -> Minutes {
        self.events_on(day)
            .map(Event::duration)
            .fold(0, Minutes::saturating_add)
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    pub(crate) fn event_mut(&mut self, id: EventId) -> Option<&mut Event> {
        self.events.get_mut(&id)
    }

    /// Events on `day`, ordered by id.
    pub fn events_on(&self, day: Day) -> impl Iterator<Item = &Event> {
        self.by_day
            .get(&day)
            .into_iter()
            .flatten()
            .filter_map(|id| self.events.get(id))
    }

    /// All events ordered by (day, id).
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.by_day
            .values()
            .flatten()
            .filter_map(|id| self.events.get(id))
    }

    pub fn add_event(&mut self, new: NewEvent) -> Result<(EventId, BudgetChange)> {
        new.validate()?;

        let id = EventId(self.next_id);
        self.next_id += 1;
        let day = new.day;
        let before = self.budget(day);

        self.events.insert(id, Event::from_new(id, new));
        self.by_day.entry(day).or_default().insert(id);

        let change = BudgetChange {
            day,
            before,
            after: self.budget(day),
        };
        debug!(event = %id, day, before, after = change.after, "event added");
        Ok((id, change))
    }

    pub fn remove_event(&mut self, id: EventId) -> Option<(Event, BudgetChange)> {
        let day = self.events.get(&id)?.day;
        let before = self.budget(day);

        let event = self.events.remove(&id)?;
        if let Some(ids) = self.by_day.get_mut(&day) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_day.remove(&day);
            }
        }

        let change = BudgetChange {
            day,
            before,
            after: self.budget(day),
        };
        debug!(event = %id, day, before, after = change.after, "event removed");
        Some((event, change))
    }

    pub fn set_today_consumed(&mut self, minutes: Minutes) -> BudgetChange {
        let before = self.budget(0);
        self.today_consumed = minutes.max(0);
        BudgetChange {
            day: 0,
            before,
            after: self.budget(0),
        }
    }

    pub fn add_today_consumed(&mut self, delta: Minutes) -> BudgetChange {
        self.set_today_consumed(self.today_consumed.saturating_add(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_and_today_time_reduce_budget() {
        let mut cal = Calendar::new(480);
        cal.add_event(NewEvent::new("standup", 0, 540, 570)).unwrap();
        cal.add_event(NewEvent::new("review", 0, 600, 660)).unwrap();
        cal.add_event(NewEvent::new("dentist", 2, 600, 720)).unwrap();
        cal.set_today_consumed(45);

        assert_eq!(cal.budget(0), 480 - 30 - 60 - 45);
        assert_eq!(cal.budget(1), 480);
        assert_eq!(cal.budget(2), 480 - 120);
    }

    #[test]
    fn today_time_saturates_instead_of_overflowing() {
        let mut cal = Calendar::new(60);
        cal.add_today_consumed(Minutes::MAX);
        cal.add_today_consumed(1);
        assert_eq!(cal.today_consumed(), Minutes::MAX);
        assert_eq!(cal.budget(0), 60 - Minutes::MAX);

        cal.add_event(NewEvent::new("workshop", 0, 0, 120)).unwrap();
        assert_eq!(cal.budget(0), Minutes::MIN);
        assert_eq!(cal.add_today_consumed(Minutes::MIN).after, 60 - 120);
    }

    #[test]
    fn add_and_remove_report_symmetric_changes() {
        let mut cal = Calendar::new(60);
        let (id, added) = cal.add_event(NewEvent::new("block", 3, 0, 60)).unwrap();
        assert_eq!(added, BudgetChange { day: 3, before: 60, after: 0 });
        assert!(added.shrank());

        let (event, removed) = cal.remove_event(id).unwrap();
        assert_eq!(event.name, "block");
        assert_eq!(removed, BudgetChange { day: 3, before: 0, after: 60 });
        assert!(cal.remove_event(id).is_none());
        assert_eq!(cal.events().count(), 0);
    }

    #[test]
    fn today_time_can_drive_budget_negative() {
        let mut cal = Calendar::new(60);
        let change = cal.add_today_consumed(80);
        assert_eq!(change.after, -20);
        assert_eq!(cal.budget(1), 60);
    }
}
