// src/store/mod.rs

//! Persistent-store collaborator.
//!
//! The planner never waits on the store. It emits
//! [`PersistCommand`](crate::planner::PersistCommand)s, the shell forwards
//! them to a background worker ([`worker`]) that drives a [`PlannerStore`],
//! and identifiers assigned by inserts flow back later through a oneshot
//! channel.
//!
//! - [`record`]: store-side encoding (epoch days, delimited id lists).
//! - [`memory`]: shared in-memory store, used by tests and as a fallback.
//! - [`file`]: TOML snapshot file.
//! - [`worker`]: the fire-and-forget queue in front of a store.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::types::{EntityKind, StoreId};

pub mod file;
pub mod memory;
pub mod record;
pub mod worker;

pub use file::TomlFileStore;
pub use memory::MemoryStore;
pub use record::{
    EventRecord, LabelRecord, ProjectRecord, SessionRecord, StoreRecord, StoreSnapshot, TaskRecord,
};
pub use worker::{spawn_store_worker, IdPoll, PendingStoreId, StoreCommand, StoreHandle};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Contract the planner requires of a persistent store.
///
/// Implementations assign identifiers; the planner never invents store ids.
pub trait PlannerStore: Send {
    /// Load every record, in store order.
    fn load(&mut self) -> BoxFuture<'_, Result<StoreSnapshot>>;

    /// Insert a record (its `id` is ignored) and return the assigned id.
    fn insert(&mut self, record: StoreRecord) -> BoxFuture<'_, Result<StoreId>>;

    /// Overwrite the record with the same kind and id.
    fn update(&mut self, record: StoreRecord) -> BoxFuture<'_, Result<()>>;

    fn delete(&mut self, kind: EntityKind, id: StoreId) -> BoxFuture<'_, Result<()>>;

    fn save_session(&mut self, session: SessionRecord) -> BoxFuture<'_, Result<()>>;
}
