// src/store/memory.rs

use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::{PlannerError, Result};
use crate::store::record::{SessionRecord, StoreRecord, StoreSnapshot};
use crate::store::{BoxFuture, PlannerStore};
use crate::types::{EntityKind, StoreId};

/// In-memory store. Clones share the same data, so a test can keep one
/// handle while the worker owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<StoreSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            data: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreSnapshot>> {
        self.data
            .lock()
            .map_err(|_| PlannerError::Store("memory store mutex poisoned".to_string()))
    }
}

impl PlannerStore for MemoryStore {
    fn load(&mut self) -> BoxFuture<'_, Result<StoreSnapshot>> {
        let result = self.lock().map(|d| d.clone());
        Box::pin(async move { result })
    }

    fn insert(&mut self, record: StoreRecord) -> BoxFuture<'_, Result<StoreId>> {
        let result = self.lock().map(|mut data| {
            let id = data.allocate_id(record.kind());
            data.insert(record, id);
            id
        });
        Box::pin(async move { result })
    }

    fn update(&mut self, record: StoreRecord) -> BoxFuture<'_, Result<()>> {
        let result = self.lock().and_then(|mut data| {
            let kind = record.kind();
            let id = record.id();
            if data.update(record) {
                Ok(())
            } else {
                Err(PlannerError::Store(format!("no {kind} with id {id:?} to update")))
            }
        });
        Box::pin(async move { result })
    }

    fn delete(&mut self, kind: EntityKind, id: StoreId) -> BoxFuture<'_, Result<()>> {
        let result = self.lock().and_then(|mut data| {
            if data.delete(kind, id) {
                Ok(())
            } else {
                Err(PlannerError::Store(format!("no {kind} with id {id} to delete")))
            }
        });
        Box::pin(async move { result })
    }

    fn save_session(&mut self, session: SessionRecord) -> BoxFuture<'_, Result<()>> {
        let result = self.lock().map(|mut data| {
            data.session = Some(session);
        });
        Box::pin(async move { result })
    }
}
