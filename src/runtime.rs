// src/runtime.rs

use std::fmt;

use time::Date;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::planner::{MutationReport, PersistCommand, Planner, PlannerSettings};
use crate::schedule::ScheduleOutcome;
use crate::store::{spawn_store_worker, IdPoll, PendingStoreId, PlannerStore, StoreHandle};

/// Async shell around the [`Planner`].
///
/// The planner stays a synchronous state machine; this type forwards the
/// persistence commands of each [`MutationReport`] to the store worker and
/// binds store-assigned ids back into the model as they arrive.
pub struct PlannerRuntime {
    planner: Planner,
    store: StoreHandle,
    pending: Vec<PendingStoreId>,
    worker: Option<JoinHandle<()>>,
}

impl fmt::Debug for PlannerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannerRuntime")
            .field("planner", &self.planner)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl PlannerRuntime {
    pub fn new(planner: Planner, store: StoreHandle) -> Self {
        Self {
            planner,
            store,
            pending: Vec::new(),
            worker: None,
        }
    }

    /// Load every record from `store`, restore the planner for `origin` and
    /// hand the store to a background worker.
    pub async fn open<S>(mut store: S, settings: PlannerSettings, origin: Date) -> Result<Self>
    where
        S: PlannerStore + 'static,
    {
        let snapshot = store.load().await?;
        let planner = Planner::restore(settings, origin, snapshot)?;
        let (handle, join) = spawn_store_worker(store);

        let mut runtime = Self::new(planner, handle);
        runtime.worker = Some(join);
        Ok(runtime)
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut Planner {
        &mut self.planner
    }

    /// Inserts still waiting for a store id.
    pub fn pending_ids(&self) -> usize {
        self.pending.len()
    }

    /// Forward a report's persistence commands and return its schedule diff.
    pub fn dispatch(&mut self, report: MutationReport) -> ScheduleOutcome {
        for warning in &report.warnings {
            debug!(%warning, "mutation reported a stale reference");
        }
        self.submit(report.persist);
        report.outcome
    }

    /// Bind every store id that has already arrived. Never waits.
    pub fn poll_store_ids(&mut self) {
        let mut follow_ups = Vec::new();
        let mut still_waiting = Vec::new();

        for mut pending in std::mem::take(&mut self.pending) {
            match pending.try_resolve() {
                IdPoll::Ready(id) => {
                    follow_ups.extend(self.planner.bind_store_id(pending.entity, id));
                }
                IdPoll::Waiting => still_waiting.push(pending),
                IdPoll::Lost => self.planner.forget_pending(pending.entity),
            }
        }

        self.pending = still_waiting;
        self.submit(follow_ups);
    }

    /// Wait for every outstanding insert, write the session and flush the
    /// store. Returns the planner with all ids bound.
    pub async fn shutdown(mut self) -> Planner {
        while !self.pending.is_empty() {
            let mut follow_ups = Vec::new();
            for pending in std::mem::take(&mut self.pending) {
                let entity = pending.entity;
                match pending.resolve().await {
                    Some(id) => follow_ups.extend(self.planner.bind_store_id(entity, id)),
                    None => self.planner.forget_pending(entity),
                }
            }
            self.submit(follow_ups);
        }

        self.store
            .submit(PersistCommand::SaveSession(self.planner.session_record()));
        self.store.flush().await;
        info!("store flushed");

        let PlannerRuntime { planner, store, worker, .. } = self;
        drop(store);
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(error = %e, "store worker ended abnormally");
            }
        }
        planner
    }

    fn submit(&mut self, commands: Vec<PersistCommand>) {
        if commands.is_empty() {
            return;
        }
        let pending = self.store.submit_all(commands);
        self.pending.extend(pending);
    }
}
