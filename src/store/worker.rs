// src/store/worker.rs

//! Background queue in front of a [`PlannerStore`].
//!
//! Commands are processed strictly in submission order on one tokio task.
//! Failures are logged and dropped: the in-memory model is the source of
//! truth and is never rolled back because a write failed.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::planner::PersistCommand;
use crate::store::record::{SessionRecord, StoreRecord};
use crate::store::PlannerStore;
use crate::types::{EntityKind, EntityRef, StoreId};

/// Unit of work for the worker.
#[derive(Debug)]
pub enum StoreCommand {
    Insert {
        entity: EntityRef,
        record: StoreRecord,
        reply: oneshot::Sender<StoreId>,
    },
    Update(StoreRecord),
    Delete {
        kind: EntityKind,
        id: StoreId,
    },
    SaveSession(SessionRecord),
    /// Answered once every earlier command has been processed.
    Flush(oneshot::Sender<()>),
}

/// Identifier the store has not answered yet.
///
/// Resolve it with [`PendingStoreId::try_resolve`] (non-blocking) or
/// [`PendingStoreId::resolve`], then bind it with
/// [`crate::planner::Planner::bind_store_id`].
#[derive(Debug)]
pub struct PendingStoreId {
    pub entity: EntityRef,
    rx: oneshot::Receiver<StoreId>,
}

/// Poll result of a [`PendingStoreId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPoll {
    Ready(StoreId),
    Waiting,
    /// The insert failed; the entity stays unbound.
    Lost,
}

impl PendingStoreId {
    pub fn try_resolve(&mut self) -> IdPoll {
        match self.rx.try_recv() {
            Ok(id) => IdPoll::Ready(id),
            Err(oneshot::error::TryRecvError::Empty) => IdPoll::Waiting,
            Err(oneshot::error::TryRecvError::Closed) => IdPoll::Lost,
        }
    }

    /// Wait for the store. `None` if the insert failed.
    pub async fn resolve(self) -> Option<StoreId> {
        self.rx.await.ok()
    }
}

/// Cloneable sender side of the worker.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<StoreCommand>,
}

impl StoreHandle {
    /// Queue a planner persistence command without waiting.
    ///
    /// Inserts return the pending identifier.
    pub fn submit(&self, command: PersistCommand) -> Option<PendingStoreId> {
        let (store_command, pending) = match command {
            PersistCommand::Insert { entity, record } => {
                let (reply, rx) = oneshot::channel();
                (
                    StoreCommand::Insert {
                        entity,
                        record,
                        reply,
                    },
                    Some(PendingStoreId { entity, rx }),
                )
            }
            PersistCommand::Update(record) => (StoreCommand::Update(record), None),
            PersistCommand::Delete { kind, id } => (StoreCommand::Delete { kind, id }, None),
            PersistCommand::SaveSession(session) => (StoreCommand::SaveSession(session), None),
        };

        if self.tx.send(store_command).is_err() {
            warn!("store worker is gone; dropping persistence command");
        }
        pending
    }

    /// Queue every command, collecting pending identifiers.
    pub fn submit_all(&self, commands: impl IntoIterator<Item = PersistCommand>) -> Vec<PendingStoreId> {
        commands.into_iter().filter_map(|c| self.submit(c)).collect()
    }

    /// Wait until everything queued so far has been processed.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(StoreCommand::Flush(tx)).is_err() {
            return;
        }
        let _ = rx.await;
    }
}

/// Spawn the worker loop. It ends when every [`StoreHandle`] is dropped.
pub fn spawn_store_worker<S>(mut store: S) -> (StoreHandle, JoinHandle<()>)
where
    S: PlannerStore + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<StoreCommand>();

    let join = tokio::spawn(async move {
        info!("store worker started");
        while let Some(command) = rx.recv().await {
            match command {
                StoreCommand::Insert {
                    entity,
                    record,
                    reply,
                } => match store.insert(record).await {
                    Ok(id) => {
                        debug!(%entity, store_id = %id, "insert acknowledged");
                        let _ = reply.send(id);
                    }
                    Err(e) => warn!(%entity, error = %e, "insert failed; entity stays unbound"),
                },
                StoreCommand::Update(record) => {
                    let kind = record.kind();
                    let id = record.id();
                    if let Err(e) = store.update(record).await {
                        warn!(%kind, ?id, error = %e, "update failed");
                    }
                }
                StoreCommand::Delete { kind, id } => {
                    if let Err(e) = store.delete(kind, id).await {
                        warn!(%kind, %id, error = %e, "delete failed");
                    }
                }
                StoreCommand::SaveSession(session) => {
                    if let Err(e) = store.save_session(session).await {
                        warn!(error = %e, "saving session failed");
                    }
                }
                StoreCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        info!("store worker exiting");
    });

    (StoreHandle { tx }, join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record::ProjectRecord;
    use crate::store::MemoryStore;
    use crate::types::ProjectId;

    fn project(name: &str) -> PersistCommand {
        PersistCommand::Insert {
            entity: EntityRef::Project(ProjectId(0)),
            record: StoreRecord::Project(ProjectRecord {
                id: None,
                name: name.to_string(),
                members: String::new(),
            }),
        }
    }

    #[tokio::test]
    async fn inserts_resolve_in_submission_order() {
        let store = MemoryStore::new();
        let (handle, _join) = spawn_store_worker(store.clone());

        let first = handle.submit(project("a")).unwrap();
        let second = handle.submit(project("b")).unwrap();
        handle.flush().await;

        assert_eq!(first.resolve().await, Some(StoreId(1)));
        assert_eq!(second.resolve().await, Some(StoreId(2)));
        assert_eq!(store.snapshot().projects.len(), 2);
    }

    #[tokio::test]
    async fn failed_writes_are_logged_not_fatal() {
        let store = MemoryStore::new();
        let (handle, _join) = spawn_store_worker(store.clone());

        handle.submit(PersistCommand::Delete {
            kind: EntityKind::Task,
            id: StoreId(77),
        });
        let mut pending = handle.submit(project("still works")).unwrap();
        handle.flush().await;

        assert_eq!(pending.try_resolve(), IdPoll::Ready(StoreId(1)));
    }
}
