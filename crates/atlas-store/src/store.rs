//! # Local Store + Transaction Coordinator
//!
//! The single owner of all persisted state. Every mutation in the
//! system (an order, a print-job transition, a conflict write-back)
//! funnels through [`LocalStore::commit`] as one atomic batch, and the
//! commit path decides how the transaction reaches the remote side.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Commit Flow                                     │
//! │                                                                         │
//! │  commit(operations)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  engine.begin() → put/delete per operation → commit()                   │
//! │       │                                                                 │
//! │       ├── any failure ──► abort() ──► TransactionFailed                 │
//! │       │                   (store byte-for-byte unchanged)               │
//! │       ▼                                                                 │
//! │  publish TransactionCommitted                                           │
//! │       │                                                                 │
//! │       ├── OFFLINE ──► append to sync_queue, pendingChanges += 1         │
//! │       │                                                                 │
//! │       └── ONLINE ───► push inline via RemoteApi                         │
//! │                         ├── acked   → done                              │
//! │                         └── failed  → append to sync_queue              │
//! │                                       (local commit stands)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store never holds private copies of committed data: reads always
//! go to the engine, and services re-read through the store before
//! mutating so they never act on a stale snapshot.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use atlas_core::{
    collections, Operation, OperationKind, SyncStatus, Transaction, TransactionStatus,
};

use crate::connectivity::ConnectivityProvider;
use crate::engine::StorageEngine;
use crate::error::{StoreError, StoreResult};
use crate::events::{EventBus, StoreEvent};
use crate::remote::RemoteApi;

// =============================================================================
// Local Store
// =============================================================================

/// Durable keyed-collection store with atomic multi-record commits and
/// offline fallback routing.
pub struct LocalStore {
    engine: Arc<dyn StorageEngine>,
    connectivity: Arc<dyn ConnectivityProvider>,
    remote: Arc<dyn RemoteApi>,
    events: EventBus,
    status: RwLock<SyncStatus>,
}

impl LocalStore {
    /// Opens the store over an engine.
    ///
    /// The pending-changes counter is re-derived from the durable sync
    /// queue, so a restart can't desynchronize it from what is actually
    /// awaiting acknowledgment.
    pub async fn open(
        engine: Arc<dyn StorageEngine>,
        connectivity: Arc<dyn ConnectivityProvider>,
        remote: Arc<dyn RemoteApi>,
    ) -> StoreResult<Arc<Self>> {
        let pending = engine.get_all(collections::SYNC_QUEUE).await?.len();

        info!(pending_changes = pending, "Local store opened");

        let status = SyncStatus {
            pending_changes: pending,
            is_online: connectivity.is_online(),
            ..SyncStatus::default()
        };

        Ok(Arc::new(LocalStore {
            engine,
            connectivity,
            remote,
            events: EventBus::new(),
            status: RwLock::new(status),
        }))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The store's event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The injected connectivity provider.
    pub fn connectivity(&self) -> Arc<dyn ConnectivityProvider> {
        Arc::clone(&self.connectivity)
    }

    /// The remote endpoint the commit path pushes through.
    pub fn remote(&self) -> Arc<dyn RemoteApi> {
        Arc::clone(&self.remote)
    }

    /// Current sync status snapshot.
    pub fn sync_status(&self) -> SyncStatus {
        let mut status = self
            .status
            .read()
            .expect("status lock poisoned")
            .clone();
        status.is_online = self.connectivity.is_online();
        status
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Reads one record, deserialized.
    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<T>> {
        self.engine
            .get(collection, id)
            .await?
            .map(|value| serde_json::from_value(value).map_err(StoreError::from))
            .transpose()
    }

    /// Reads one record as a raw JSON value.
    pub async fn get_raw(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        self.engine.get(collection, id).await
    }

    /// Reads all records of a collection, deserialized.
    pub async fn get_all<T: DeserializeOwned>(&self, collection: &str) -> StoreResult<Vec<T>> {
        self.engine
            .get_all(collection)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(StoreError::from))
            .collect()
    }

    /// Reads all records matching a predicate.
    pub async fn query<T, F>(&self, collection: &str, predicate: F) -> StoreResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let mut records = self.get_all::<T>(collection).await?;
        records.retain(|record| predicate(record));
        Ok(records)
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Applies a batch of operations as one atomic transaction and
    /// routes it toward the remote endpoint.
    ///
    /// ## Guarantees
    /// - all-or-nothing: a failed batch leaves the store unchanged and
    ///   surfaces [`StoreError::TransactionFailed`]
    /// - committed data is visible to every read before this returns
    /// - a remote failure NEVER undoes the local commit; the
    ///   transaction just stays queued for a later cycle
    pub async fn commit(&self, operations: Vec<Operation>) -> StoreResult<Transaction> {
        let mut transaction = Transaction::new(operations);

        debug!(
            id = %transaction.id,
            operations = transaction.operations.len(),
            "Committing transaction"
        );

        if let Err(e) = self.apply(&transaction).await {
            transaction.status = TransactionStatus::RolledBack;
            warn!(id = %transaction.id, error = %e, "Transaction rolled back");
            return Err(StoreError::TransactionFailed {
                id: transaction.id,
                source: Box::new(e),
            });
        }

        transaction.status = TransactionStatus::Committed;
        self.events
            .publish(StoreEvent::TransactionCommitted(transaction.clone()));

        // Sync routing. Offline commits queue; online commits try the
        // remote inline and fall back to the queue on any failure.
        if !self.connectivity.is_online() {
            self.enqueue_for_sync(&transaction).await?;
            return Ok(transaction);
        }

        if let Err(e) = self.remote.push_transaction(&transaction).await {
            warn!(
                id = %transaction.id,
                error = %e,
                "Inline sync failed; queueing transaction for retry"
            );
            self.enqueue_for_sync(&transaction).await?;
        } else {
            debug!(id = %transaction.id, "Transaction synced inline");
        }

        Ok(transaction)
    }

    /// Applies every operation through one atomic write handle.
    async fn apply(&self, transaction: &Transaction) -> StoreResult<()> {
        let mut write = self.engine.begin().await?;

        let mut failure = None;
        for op in &transaction.operations {
            let result = match op.kind {
                OperationKind::Create | OperationKind::Update => match op.data.as_ref() {
                    Some(data) => write.put(&op.collection, &op.id, data).await,
                    None => Err(StoreError::InvalidOperation(format!(
                        "{:?} on {}/{} has no data",
                        op.kind, op.collection, op.id
                    ))),
                },
                OperationKind::Delete => write.delete(&op.collection, &op.id).await,
            };

            if let Err(e) = result {
                failure = Some(e);
                break;
            }
        }

        match failure {
            Some(e) => {
                if let Err(abort_err) = write.abort().await {
                    warn!(error = %abort_err, "Atomic write abort failed");
                }
                Err(e)
            }
            None => write.commit().await,
        }
    }

    // =========================================================================
    // Sync queue
    // =========================================================================

    /// Durably appends a committed transaction to the sync queue.
    async fn enqueue_for_sync(&self, transaction: &Transaction) -> StoreResult<()> {
        let value = serde_json::to_value(transaction)?;
        self.write_single(collections::SYNC_QUEUE, &transaction.id, Some(&value))
            .await?;

        let status = {
            let mut status = self.status.write().expect("status lock poisoned");
            status.pending_changes += 1;
            status.clone()
        };
        info!(
            id = %transaction.id,
            pending_changes = status.pending_changes,
            "Transaction queued for sync"
        );
        self.publish_status(status);
        Ok(())
    }

    /// Returns queued transactions, oldest first.
    pub async fn queued_transactions(&self) -> StoreResult<Vec<Transaction>> {
        let mut queued: Vec<Transaction> = self.get_all(collections::SYNC_QUEUE).await?;
        queued.sort_by_key(|tx| tx.timestamp);
        Ok(queued)
    }

    /// Removes an acknowledged transaction from the sync queue.
    pub async fn remove_queued(&self, transaction_id: &str) -> StoreResult<()> {
        self.write_single(collections::SYNC_QUEUE, transaction_id, None)
            .await?;

        let status = {
            let mut status = self.status.write().expect("status lock poisoned");
            status.pending_changes = status.pending_changes.saturating_sub(1);
            status.clone()
        };
        debug!(
            id = %transaction_id,
            pending_changes = status.pending_changes,
            "Transaction removed from sync queue"
        );
        self.publish_status(status);
        Ok(())
    }

    /// Records the outcome of a finished sync cycle.
    ///
    /// Errors accumulate across cycles; a clean cycle clears them.
    pub fn record_sync_cycle(&self, errors: &[String]) {
        let status = {
            let mut status = self.status.write().expect("status lock poisoned");
            status.last_sync = Some(chrono::Utc::now());
            if errors.is_empty() {
                status.sync_errors.clear();
            } else {
                status.sync_errors.extend_from_slice(errors);
            }
            status.clone()
        };
        self.publish_status(status);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// One put-or-delete through its own atomic write.
    async fn write_single(
        &self,
        collection: &str,
        id: &str,
        value: Option<&Value>,
    ) -> StoreResult<()> {
        let mut write = self.engine.begin().await?;
        let result = match value {
            Some(v) => write.put(collection, id, v).await,
            None => write.delete(collection, id).await,
        };
        match result {
            Ok(()) => write.commit().await,
            Err(e) => {
                if let Err(abort_err) = write.abort().await {
                    warn!(error = %abort_err, "Atomic write abort failed");
                }
                Err(e)
            }
        }
    }

    fn publish_status(&self, mut status: SyncStatus) {
        status.is_online = self.connectivity.is_online();
        self.events.publish(StoreEvent::SyncStatusChanged(status));
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
