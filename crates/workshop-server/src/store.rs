//! The Record Store: the canonical, ordered list of workshop records.
//!
//! Every mutation is applied to the in-memory list first and then written to
//! the remote. A failed remote write rolls back exactly that mutation, located
//! by record id, and surfaces one error to the caller. Nothing is retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use workshop_core::{from_remote, seed_records, to_remote, WorkshopRecord};
use workshop_history::{
    InsertRecord, MutationBox, PendingLedger, RemoveRecord, ReplaceRecord,
};

use crate::config::OfflineFallback;
use crate::error::{RemoteError, StoreError};
use crate::remote::Remote;

/// Whether the consumer of a load is still around to receive it
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// The consumer went away; results arriving after this are dropped
    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of [`RecordStore::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Remote rows were loaded
    Loaded { count: usize },
    /// The remote was empty and has been seeded
    Seeded { count: usize },
    /// The remote was unreachable; serving the offline fallback
    Degraded { count: usize },
    /// The consumer unmounted before the result arrived
    Discarded,
}

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<WorkshopRecord>,
    ledger: PendingLedger,
    degraded: bool,
}

pub struct RecordStore {
    remote: Arc<dyn Remote>,
    fallback: OfflineFallback,
    state: RwLock<StoreState>,
}

impl RecordStore {
    pub fn new(remote: Arc<dyn Remote>, fallback: OfflineFallback) -> Self {
        Self {
            remote,
            fallback,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Replace the collection with the remote's, newest first
    pub async fn load(&self, liveness: &Liveness) -> LoadOutcome {
        let (records, outcome) = match self.remote.fetch_all().await {
            Ok(rows) if rows.is_empty() => {
                let seed = seed_records();
                self.seed_remote(&seed).await;
                let count = seed.len();
                (seed, LoadOutcome::Seeded { count })
            }
            Ok(rows) => {
                let records: Vec<WorkshopRecord> = rows
                    .into_iter()
                    .filter_map(|row| match from_remote(row) {
                        Ok(record) => Some(record),
                        Err(e) => {
                            tracing::warn!("Skipping remote row: {}", e);
                            None
                        }
                    })
                    .collect();
                let count = records.len();
                (records, LoadOutcome::Loaded { count })
            }
            Err(e) => {
                tracing::error!(error = %e, fallback = ?self.fallback, "Remote unreachable, serving local records only");
                let records = match self.fallback {
                    OfflineFallback::Seed => seed_records(),
                    OfflineFallback::Empty => Vec::new(),
                };
                let count = records.len();
                (records, LoadOutcome::Degraded { count })
            }
        };

        if !liveness.is_alive() {
            tracing::debug!("Load finished after unmount; discarding");
            return LoadOutcome::Discarded;
        }

        let mut state = self.state.write().await;
        // The loaded list supersedes in-flight mutations; their late outcomes
        // no longer touch the collection
        if state.ledger.pending_count() > 0 {
            tracing::warn!(pending = state.ledger.pending_count(), "Reload drops pending mutations");
            state.ledger.clear();
        }
        state.records = records;
        state.degraded = matches!(outcome, LoadOutcome::Degraded { .. });
        tracing::info!(?outcome, "Workshops loaded");
        outcome
    }

    async fn seed_remote(&self, seed: &[WorkshopRecord]) {
        let rows = seed.iter().map(to_remote).collect();
        match self.remote.upsert_many(rows).await {
            Ok(()) => tracing::info!(count = seed.len(), "Seeded empty remote"),
            Err(e) => tracing::warn!(error = %e, "Could not seed remote"),
        }
    }

    /// Apply `mutation` locally, then resolve it by the outcome of `remote_call`
    async fn optimistic(
        &self,
        mutation: MutationBox,
        remote_call: BoxFuture<'_, Result<(), RemoteError>>,
    ) -> Result<(), StoreError> {
        let id = mutation.record_id().to_string();
        let description = mutation.description().to_string();

        let (ticket, degraded) = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let ticket = state.ledger.apply(mutation, &mut state.records)?;
            (ticket, state.degraded)
        };

        if degraded {
            tracing::warn!(%id, "{} kept locally; remote is offline", description);
            self.state.write().await.ledger.confirm(ticket);
            return Ok(());
        }

        match remote_call.await {
            Ok(()) => {
                self.state.write().await.ledger.confirm(ticket);
                tracing::debug!(%id, %ticket, "{} confirmed", description);
                Ok(())
            }
            Err(source) => {
                tracing::error!(%id, %ticket, error = %source, "{} failed; rolling back", description);
                let mut guard = self.state.write().await;
                let state = &mut *guard;
                state.ledger.rollback(ticket, &mut state.records);
                Err(StoreError::Remote { id, source })
            }
        }
    }

    /// Prepend a new record
    pub async fn add(&self, record: WorkshopRecord) -> Result<(), StoreError> {
        let call = self.remote.insert(to_remote(&record));
        self.optimistic(Box::new(InsertRecord::new(record)), call)
            .await
    }

    /// Replace the record with the same id
    pub async fn update(&self, record: WorkshopRecord) -> Result<(), StoreError> {
        let call = self.remote.update(&record.id, to_remote(&record));
        self.optimistic(Box::new(ReplaceRecord::new(record)), call)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let call = self.remote.delete(id);
        self.optimistic(Box::new(RemoveRecord::new(id)), call).await
    }

    /// Snapshot of the collection, including unconfirmed changes
    pub async fn list(&self) -> Vec<WorkshopRecord> {
        self.state.read().await.records.clone()
    }

    pub async fn get(&self, id: &str) -> Option<WorkshopRecord> {
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Whether the last load fell back to local-only records
    pub async fn is_degraded(&self) -> bool {
        self.state.read().await.degraded
    }

    /// Number of mutations still awaiting their remote write
    pub async fn pending(&self) -> usize {
        self.state.read().await.ledger.pending_count()
    }
}
