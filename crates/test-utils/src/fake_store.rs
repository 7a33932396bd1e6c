use std::sync::{Arc, Mutex};

use dayplan::errors::{PlannerError, Result};
use dayplan::store::{BoxFuture, MemoryStore, PlannerStore, SessionRecord, StoreRecord, StoreSnapshot};
use dayplan::types::{EntityKind, StoreId};

/// One call the store received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Insert(EntityKind),
    Update(EntityKind, Option<StoreId>),
    Delete(EntityKind, StoreId),
    SaveSession,
}

/// A store that:
/// - records every call it receives
/// - delegates to a shared [`MemoryStore`]
/// - optionally rejects inserts, to exercise lost identifiers.
#[derive(Clone)]
pub struct RecordingStore {
    inner: MemoryStore,
    ops: Arc<Mutex<Vec<StoreOp>>>,
    fail_inserts: bool,
}

impl RecordingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ops: Arc::new(Mutex::new(Vec::new())),
            fail_inserts: false,
        }
    }

    pub fn failing_inserts(inner: MemoryStore) -> Self {
        Self {
            fail_inserts: true,
            ..Self::new(inner)
        }
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap().clone()
    }

    fn log(&self, op: StoreOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl PlannerStore for RecordingStore {
    fn load(&mut self) -> BoxFuture<'_, Result<StoreSnapshot>> {
        self.inner.load()
    }

    fn insert(&mut self, record: StoreRecord) -> BoxFuture<'_, Result<StoreId>> {
        self.log(StoreOp::Insert(record.kind()));
        if self.fail_inserts {
            return Box::pin(async move {
                Err(PlannerError::Other(anyhow::anyhow!("insert rejected by test store")))
            });
        }
        self.inner.insert(record)
    }

    fn update(&mut self, record: StoreRecord) -> BoxFuture<'_, Result<()>> {
        self.log(StoreOp::Update(record.kind(), record.id()));
        self.inner.update(record)
    }

    fn delete(&mut self, kind: EntityKind, id: StoreId) -> BoxFuture<'_, Result<()>> {
        self.log(StoreOp::Delete(kind, id));
        self.inner.delete(kind, id)
    }

    fn save_session(&mut self, session: SessionRecord) -> BoxFuture<'_, Result<()>> {
        self.log(StoreOp::SaveSession);
        self.inner.save_session(session)
    }
}
