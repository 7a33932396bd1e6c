// src/planner/persist.rs

//! Persistence bookkeeping and deferred identity binding.
//!
//! A new entity is inserted with `store_id == None` and an `Insert` command.
//! Until the store answers, the entity is *pending*: later edits only mark it
//! dirty and a delete is remembered. [`Planner::bind_store_id`] patches the
//! id in and returns the follow-up writes (the deferred update or delete, and
//! updates for every record that references the entity, since those records
//! were written without its id).

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::clock::{index_to_epoch_day, to_epoch_day};
use crate::model::Task;
use crate::planner::Planner;
use crate::store::record::{
    encode_ids, EventRecord, LabelRecord, ProjectRecord, SessionRecord, StoreRecord, TaskRecord,
};
use crate::types::{EntityKind, EntityRef, StoreId, TaskId};

/// Write the planner wants the store to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistCommand {
    /// The store must answer with an id for `entity`.
    Insert {
        entity: EntityRef,
        record: StoreRecord,
    },
    Update(StoreRecord),
    Delete {
        kind: EntityKind,
        id: StoreId,
    },
    SaveSession(SessionRecord),
}

#[derive(Debug, Default)]
pub(crate) struct SyncState {
    /// Inserted, waiting for a store id.
    pending: HashSet<EntityRef>,
    /// Pending entities edited after their insert was queued.
    dirty: HashSet<EntityRef>,
    /// Pending entities deleted before their id arrived.
    deleted: HashSet<EntityRef>,
}

impl Planner {
    /// Whether an insert for `entity` is still waiting for the store.
    pub fn is_pending(&self, entity: EntityRef) -> bool {
        self.sync.pending.contains(&entity)
    }

    /// Patch the store-assigned id into `entity` and return follow-up writes.
    pub fn bind_store_id(&mut self, entity: EntityRef, id: StoreId) -> Vec<PersistCommand> {
        self.sync.pending.remove(&entity);

        if self.sync.deleted.remove(&entity) || !self.set_store_id(entity, id) {
            debug!(%entity, store_id = %id, "entity deleted before its id arrived");
            return vec![PersistCommand::Delete {
                kind: entity.kind(),
                id,
            }];
        }
        debug!(%entity, store_id = %id, "store id bound");

        let mut out = Vec::new();
        if self.sync.dirty.remove(&entity) {
            self.persist_changed(entity, &mut out);
        }
        for other in self.referencing(entity) {
            self.persist_changed(other, &mut out);
        }
        if let (EntityRef::Task(task), Some(timer)) = (entity, self.timer) {
            if timer.task == task {
                out.push(PersistCommand::SaveSession(self.session_record()));
            }
        }
        out
    }

    /// The store failed to insert `entity`. Its next edit re-inserts it.
    pub fn forget_pending(&mut self, entity: EntityRef) {
        if self.sync.pending.remove(&entity) {
            warn!(%entity, "insert lost; entity will be re-inserted on its next change");
        }
        self.sync.dirty.remove(&entity);
        self.sync.deleted.remove(&entity);
    }

    /// Session state (today time, active timer) as the store encodes it.
    pub fn session_record(&self) -> SessionRecord {
        SessionRecord {
            epoch_day: to_epoch_day(self.origin),
            today_minutes: self.calendar.today_consumed(),
            timer_task: self
                .timer
                .and_then(|t| self.graph.get(t.task))
                .and_then(|t| t.store_id),
            timer_started_unix: self.timer.map(|t| t.started_at.unix_timestamp()),
        }
    }

    /// Current record of `entity`, if it still exists.
    pub fn record_of(&self, entity: EntityRef) -> Option<StoreRecord> {
        match entity {
            EntityRef::Task(id) => self.graph.get(id).map(|t| StoreRecord::Task(self.task_record(t))),
            EntityRef::Event(id) => self.calendar.event(id).map(|e| {
                StoreRecord::Event(EventRecord {
                    id: e.store_id,
                    name: e.name.clone(),
                    epoch_day: index_to_epoch_day(self.origin, e.day),
                    start_minute: e.start,
                    end_minute: e.end,
                })
            }),
            EntityRef::Project(id) => self.projects.get(&id).map(|p| {
                StoreRecord::Project(ProjectRecord {
                    id: p.store_id,
                    name: p.name.clone(),
                    members: self.encode_tasks(p.members.iter().copied()),
                })
            }),
            EntityRef::Label(id) => self.labels.get(&id).map(|l| {
                StoreRecord::Label(LabelRecord {
                    id: l.store_id,
                    name: l.name.clone(),
                    members: self.encode_tasks(l.members.iter().copied()),
                })
            }),
        }
    }

    fn task_record(&self, task: &Task) -> TaskRecord {
        TaskRecord {
            id: task.store_id,
            name: task.name.clone(),
            duration_minutes: task.duration,
            created_epoch_day: index_to_epoch_day(self.origin, task.created),
            due_epoch_day: task.due.map(|d| index_to_epoch_day(self.origin, d)),
            parents: self.encode_tasks(task.parents.iter().copied()),
            children: self.encode_tasks(task.children.iter().copied()),
            completed_epoch_day: task
                .completion_day()
                .map(|d| index_to_epoch_day(self.origin, d)),
            actual_minutes: task.actual_minutes,
            tracked_minutes: task.tracked_minutes,
            project: task
                .project
                .and_then(|p| self.projects.get(&p))
                .and_then(|p| p.store_id),
            labels: encode_ids(
                task.labels
                    .iter()
                    .filter_map(|l| self.labels.get(l))
                    .filter_map(|l| l.store_id),
            ),
        }
    }

    /// Unbound tasks are left out; they are patched in when they bind.
    fn encode_tasks(&self, ids: impl Iterator<Item = TaskId>) -> String {
        encode_ids(
            ids.filter_map(|id| self.graph.get(id))
                .filter_map(|t| t.store_id),
        )
    }

    fn store_id_of(&self, entity: EntityRef) -> Option<StoreId> {
        match entity {
            EntityRef::Task(id) => self.graph.get(id).and_then(|t| t.store_id),
            EntityRef::Event(id) => self.calendar.event(id).and_then(|e| e.store_id),
            EntityRef::Project(id) => self.projects.get(&id).and_then(|p| p.store_id),
            EntityRef::Label(id) => self.labels.get(&id).and_then(|l| l.store_id),
        }
    }

    /// Returns `false` if the entity no longer exists.
    pub(crate) fn set_store_id(&mut self, entity: EntityRef, id: StoreId) -> bool {
        let slot = match entity {
            EntityRef::Task(t) => self.graph.get_mut(t).map(|t| &mut t.store_id),
            EntityRef::Event(e) => self.calendar.event_mut(e).map(|e| &mut e.store_id),
            EntityRef::Project(p) => self.projects.get_mut(&p).map(|p| &mut p.store_id),
            EntityRef::Label(l) => self.labels.get_mut(&l).map(|l| &mut l.store_id),
        };
        match slot {
            Some(slot) => {
                *slot = Some(id);
                true
            }
            None => false,
        }
    }

    /// Entities whose records mention `entity`.
    fn referencing(&self, entity: EntityRef) -> Vec<EntityRef> {
        match entity {
            EntityRef::Task(id) => match self.graph.get(id) {
                Some(task) => task
                    .parents
                    .iter()
                    .chain(task.children.iter())
                    .map(|t| EntityRef::Task(*t))
                    .chain(task.project.map(EntityRef::Project))
                    .chain(task.labels.iter().map(|l| EntityRef::Label(*l)))
                    .collect(),
                None => Vec::new(),
            },
            EntityRef::Project(id) => self
                .projects
                .get(&id)
                .map(|p| p.members.iter().map(|t| EntityRef::Task(*t)).collect())
                .unwrap_or_default(),
            EntityRef::Label(id) => self
                .labels
                .get(&id)
                .map(|l| l.members.iter().map(|t| EntityRef::Task(*t)).collect())
                .unwrap_or_default(),
            EntityRef::Event(_) => Vec::new(),
        }
    }

    /// Queue the insert of a freshly created entity.
    pub(crate) fn persist_new(&mut self, entity: EntityRef, out: &mut Vec<PersistCommand>) {
        if let Some(record) = self.record_of(entity) {
            self.sync.pending.insert(entity);
            out.push(PersistCommand::Insert { entity, record });
        }
    }

    /// Queue the update of an edited entity (or defer it while pending).
    pub(crate) fn persist_changed(&mut self, entity: EntityRef, out: &mut Vec<PersistCommand>) {
        if self.store_id_of(entity).is_some() {
            if let Some(record) = self.record_of(entity) {
                out.push(PersistCommand::Update(record));
            }
        } else if self.sync.pending.contains(&entity) {
            self.sync.dirty.insert(entity);
        } else {
            self.persist_new(entity, out);
        }
    }

    /// Queue the delete of an entity already removed from the model.
    pub(crate) fn persist_deleted(
        &mut self,
        entity: EntityRef,
        store_id: Option<StoreId>,
        out: &mut Vec<PersistCommand>,
    ) {
        self.sync.dirty.remove(&entity);
        match store_id {
            Some(id) => out.push(PersistCommand::Delete {
                kind: entity.kind(),
                id,
            }),
            None => {
                if self.sync.pending.contains(&entity) {
                    self.sync.deleted.insert(entity);
                }
            }
        }
    }
}
