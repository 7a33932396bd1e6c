// src/store/record.rs

//! Store-side encoding of planner entities.
//!
//! Dates are days since 1970-01-01. Id sets (parents, children, members,
//! labels) are comma-delimited lists of store ids, as in a relational table
//! with one text column per set. The in-memory model never holds this text;
//! conversion happens only here.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{EntityKind, StoreId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StoreId>,
    pub name: String,
    pub duration_minutes: i64,
    pub created_epoch_day: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_epoch_day: Option<i64>,
    #[serde(default)]
    pub parents: String,
    #[serde(default)]
    pub children: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_epoch_day: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<i64>,
    #[serde(default)]
    pub tracked_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<StoreId>,
    #[serde(default)]
    pub labels: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StoreId>,
    pub name: String,
    pub epoch_day: i64,
    pub start_minute: i64,
    pub end_minute: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StoreId>,
    pub name: String,
    #[serde(default)]
    pub members: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StoreId>,
    pub name: String,
    #[serde(default)]
    pub members: String,
}

/// Per-day session state that must survive restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Day the `today_minutes` counter belongs to.
    pub epoch_day: i64,
    #[serde(default)]
    pub today_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_task: Option<StoreId>,
    /// Unix timestamp (seconds) the active timer started at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_started_unix: Option<i64>,
}

/// Any persisted entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRecord {
    Task(TaskRecord),
    Event(EventRecord),
    Project(ProjectRecord),
    Label(LabelRecord),
}

impl StoreRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            StoreRecord::Task(_) => EntityKind::Task,
            StoreRecord::Event(_) => EntityKind::Event,
            StoreRecord::Project(_) => EntityKind::Project,
            StoreRecord::Label(_) => EntityKind::Label,
        }
    }

    pub fn id(&self) -> Option<StoreId> {
        match self {
            StoreRecord::Task(r) => r.id,
            StoreRecord::Event(r) => r.id,
            StoreRecord::Project(r) => r.id,
            StoreRecord::Label(r) => r.id,
        }
    }

    pub fn set_id(&mut self, id: StoreId) {
        match self {
            StoreRecord::Task(r) => r.id = Some(id),
            StoreRecord::Event(r) => r.id = Some(id),
            StoreRecord::Project(r) => r.id = Some(id),
            StoreRecord::Label(r) => r.id = Some(id),
        }
    }
}

/// Highest id ever handed out per kind. Ids of deleted records are not
/// reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdWatermarks {
    #[serde(default)]
    pub task: i64,
    #[serde(default)]
    pub event: i64,
    #[serde(default)]
    pub project: i64,
    #[serde(default)]
    pub label: i64,
}

impl IdWatermarks {
    fn slot(&mut self, kind: EntityKind) -> &mut i64 {
        match kind {
            EntityKind::Task => &mut self.task,
            EntityKind::Event => &mut self.event,
            EntityKind::Project => &mut self.project,
            EntityKind::Label => &mut self.label,
        }
    }
}

/// Everything `load` returns at startup. Record order is the store's order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionRecord>,
    #[serde(default)]
    pub watermarks: IdWatermarks,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
    #[serde(default)]
    pub labels: Vec<LabelRecord>,
}

impl StoreSnapshot {
    /// Highest id in use for `kind`, or 0.
    pub fn max_id(&self, kind: EntityKind) -> i64 {
        let ids: Box<dyn Iterator<Item = Option<StoreId>>> = match kind {
            EntityKind::Task => Box::new(self.tasks.iter().map(|r| r.id)),
            EntityKind::Event => Box::new(self.events.iter().map(|r| r.id)),
            EntityKind::Project => Box::new(self.projects.iter().map(|r| r.id)),
            EntityKind::Label => Box::new(self.labels.iter().map(|r| r.id)),
        };
        ids.flatten().map(|id| id.0).max().unwrap_or(0)
    }

    /// Next unused id for `kind`.
    pub fn allocate_id(&mut self, kind: EntityKind) -> StoreId {
        let max = self.max_id(kind);
        let slot = self.watermarks.slot(kind);
        *slot = (*slot).max(max) + 1;
        StoreId(*slot)
    }

    /// Append `record` under `id`.
    pub fn insert(&mut self, mut record: StoreRecord, id: StoreId) {
        record.set_id(id);
        match record {
            StoreRecord::Task(r) => self.tasks.push(r),
            StoreRecord::Event(r) => self.events.push(r),
            StoreRecord::Project(r) => self.projects.push(r),
            StoreRecord::Label(r) => self.labels.push(r),
        }
    }

    /// Replace the record with the same kind and id. Returns `false` if absent.
    pub fn update(&mut self, record: StoreRecord) -> bool {
        let Some(id) = record.id() else { return false };
        fn replace<T>(rows: &mut [T], id: StoreId, row: T, key: impl Fn(&T) -> Option<StoreId>) -> bool {
            match rows.iter_mut().find(|r| key(r) == Some(id)) {
                Some(slot) => {
                    *slot = row;
                    true
                }
                None => false,
            }
        }
        match record {
            StoreRecord::Task(r) => replace(&mut self.tasks, id, r, |r| r.id),
            StoreRecord::Event(r) => replace(&mut self.events, id, r, |r| r.id),
            StoreRecord::Project(r) => replace(&mut self.projects, id, r, |r| r.id),
            StoreRecord::Label(r) => replace(&mut self.labels, id, r, |r| r.id),
        }
    }

    /// Remove the record of `kind` with `id`. Returns `false` if absent.
    pub fn delete(&mut self, kind: EntityKind, id: StoreId) -> bool {
        let before = self.len(kind);
        match kind {
            EntityKind::Task => self.tasks.retain(|r| r.id != Some(id)),
            EntityKind::Event => self.events.retain(|r| r.id != Some(id)),
            EntityKind::Project => self.projects.retain(|r| r.id != Some(id)),
            EntityKind::Label => self.labels.retain(|r| r.id != Some(id)),
        }
        self.len(kind) != before
    }

    fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Task => self.tasks.len(),
            EntityKind::Event => self.events.len(),
            EntityKind::Project => self.projects.len(),
            EntityKind::Label => self.labels.len(),
        }
    }
}

/// Encode ids as `"1,2,3"`.
pub fn encode_ids(ids: impl IntoIterator<Item = StoreId>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a delimited id list. Empty segments are ignored; segments that
/// are not ids are skipped with a warning.
pub fn decode_ids(raw: &str) -> Vec<StoreId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<StoreId>() {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(list = raw, error = %e, "unparsable store id skipped");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimited_ids_tolerate_whitespace_and_empties() {
        assert_eq!(encode_ids([StoreId(3), StoreId(10)]), "3,10");
        assert_eq!(encode_ids(std::iter::empty()), "");
        assert_eq!(decode_ids(" 3, ,10,"), vec![StoreId(3), StoreId(10)]);
        assert!(decode_ids("").is_empty());
        assert_eq!(decode_ids("1,x,-,4"), vec![StoreId(1), StoreId(4)]);
    }

    #[test]
    fn snapshot_update_and_delete_by_kind_and_id() {
        let mut snap = StoreSnapshot::default();
        let record = StoreRecord::Project(ProjectRecord {
            id: None,
            name: "home".into(),
            members: String::new(),
        });
        snap.insert(record, StoreId(4));
        assert_eq!(snap.max_id(EntityKind::Project), 4);
        assert_eq!(snap.max_id(EntityKind::Task), 0);

        let renamed = StoreRecord::Project(ProjectRecord {
            id: Some(StoreId(4)),
            name: "house".into(),
            members: "1".into(),
        });
        assert!(snap.update(renamed));
        assert_eq!(snap.projects[0].name, "house");

        assert!(!snap.delete(EntityKind::Label, StoreId(4)));
        assert!(snap.delete(EntityKind::Project, StoreId(4)));
        assert!(snap.projects.is_empty());
    }

    #[test]
    fn deleted_ids_are_not_handed_out_again() {
        let mut snap = StoreSnapshot::default();
        let first = snap.allocate_id(EntityKind::Task);
        let project = snap.allocate_id(EntityKind::Project);
        snap.insert(
            StoreRecord::Project(ProjectRecord {
                id: None,
                name: "p".into(),
                members: String::new(),
            }),
            project,
        );
        assert_eq!(first, StoreId(1));
        assert_eq!(snap.allocate_id(EntityKind::Task), StoreId(2));
        assert!(snap.delete(EntityKind::Project, StoreId(1)));
        assert_eq!(snap.allocate_id(EntityKind::Project), StoreId(2));
    }
}
