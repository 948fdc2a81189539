//! # Sync Engine
//!
//! Drains the durable sync queue against the remote endpoint in bounded
//! batches, resolves conflicts, and runs the opportunistic background
//! cadence.
//!
//! ## Cycle Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        One Sync Cycle                                   │
//! │                                                                         │
//! │  start_sync()                                                           │
//! │       │                                                                 │
//! │       ├── cycle already active? ──► Err(AlreadyRunning)  (fail fast)    │
//! │       ├── offline?              ──► Err(Offline)   (queue untouched)    │
//! │       ├── queue empty?          ──► Ok(success, 0) (zero network)       │
//! │       ▼                                                                 │
//! │  partition queue into batches of batch_size                             │
//! │                                                                         │
//! │  batch 1: [t1, t2, t3]      batch 2: [t4, t5, t6]                       │
//! │     t1 ✓ → dequeued            t4 ✓ → dequeued                          │
//! │     t2 ✗ → stays queued        t5 ✓ → dequeued                          │
//! │     t3 ── skipped this cycle   t6 ✓ → dequeued                          │
//! │     (batch-local abort)        (independent of batch 1's failure)       │
//! │                                                                         │
//! │  report: { success: false, syncedItems: 4, errors: ["t2: ..."] }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The batch-local abort with cross-batch continuation is deliberate:
//! a failure usually poisons only the transactions behind it in its own
//! batch (ordering), while later batches are independent work that
//! should not be starved by it.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use atlas_core::{record, Conflict, Operation, SyncReport};
use atlas_store::{LocalStore, StoreEvent};

use crate::config::SyncConfig;
use crate::conflict;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Cycle Guard
// =============================================================================

/// RAII guard enforcing at most one active cycle system-wide.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> SyncResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::AlreadyRunning)?;
        Ok(CycleGuard { flag })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// =============================================================================
// Sync Engine
// =============================================================================

/// The synchronization engine.
pub struct SyncEngine {
    store: Arc<LocalStore>,
    config: SyncConfig,
    cycle_active: AtomicBool,
}

/// Handle controlling the background cadence task.
pub struct SyncEngineHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SyncEngineHandle {
    /// Requests a cooperative stop and waits for the task to finish.
    ///
    /// A cycle already in flight runs to completion first; the stop is
    /// honored at the next loop iteration boundary.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

impl SyncEngine {
    /// Creates an engine over the store. The remote endpoint is the one
    /// the store was opened with.
    pub fn new(store: Arc<LocalStore>, config: SyncConfig) -> Arc<Self> {
        Arc::new(SyncEngine {
            store,
            config,
            cycle_active: AtomicBool::new(false),
        })
    }

    // =========================================================================
    // One cycle
    // =========================================================================

    /// Runs one sync cycle to completion.
    ///
    /// ## Errors
    /// - [`SyncError::AlreadyRunning`] if a cycle is active (fails fast,
    ///   never queues behind the running cycle)
    /// - [`SyncError::Offline`] if connectivity is down; the queue is
    ///   not touched
    pub async fn start_sync(&self) -> SyncResult<SyncReport> {
        let _guard = CycleGuard::acquire(&self.cycle_active)?;

        if !self.store.connectivity().is_online() {
            return Err(SyncError::Offline);
        }

        let queue = self.store.queued_transactions().await?;
        if queue.is_empty() {
            debug!("Sync queue empty; nothing to push");
            self.store.record_sync_cycle(&[]);
            return Ok(SyncReport::success(0));
        }

        info!(
            pending = queue.len(),
            batch_size = self.config.batch_size,
            "Starting sync cycle"
        );

        let remote = self.store.remote();
        let mut synced_items = 0usize;
        let mut errors = Vec::new();

        for batch in queue.chunks(self.config.batch_size) {
            for transaction in batch {
                match remote.push_transaction(transaction).await {
                    Ok(()) => {
                        self.store.remove_queued(&transaction.id).await?;
                        synced_items += 1;
                    }
                    Err(e) => {
                        // Abort the remainder of THIS batch only; the
                        // failed transaction stays queued for next cycle.
                        warn!(
                            id = %transaction.id,
                            error = %e,
                            "Transaction sync failed; aborting remainder of batch"
                        );
                        errors.push(format!("transaction {}: {}", transaction.id, e));
                        break;
                    }
                }
            }
        }

        self.store.record_sync_cycle(&errors);

        let report = SyncReport {
            success: errors.is_empty(),
            synced_items,
            errors,
            timestamp: chrono::Utc::now(),
        };

        info!(
            synced = report.synced_items,
            errors = report.errors.len(),
            "Sync cycle finished"
        );

        Ok(report)
    }

    // =========================================================================
    // Conflict resolution
    // =========================================================================

    /// Resolves a conflict and writes the winner back through the
    /// transaction coordinator (so the resolution itself syncs like any
    /// other local write).
    pub async fn resolve_conflict(&self, conflict: &Conflict) -> SyncResult<Value> {
        let winner = conflict::resolve(conflict)?;
        let meta = record::meta_of(&winner)?;

        info!(
            id = %meta.id,
            collection = %conflict.collection,
            resolution = ?conflict.resolution,
            "Resolving conflict"
        );

        self.store
            .commit(vec![Operation::update(
                conflict.collection.clone(),
                meta.id,
                winner.clone(),
                conflict.local.clone(),
            )])
            .await?;

        Ok(winner)
    }

    // =========================================================================
    // Background cadence
    // =========================================================================

    /// Spawns the background task: periodic opportunistic cycles (if
    /// `sync_interval_secs` > 0) plus a cycle on every offline→online
    /// transition. Failures are logged, never raised; nobody is
    /// waiting on a background cycle.
    pub fn spawn(self: &Arc<Self>) -> SyncEngineHandle {
        let engine = Arc::clone(self);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(engine.run(shutdown_rx));
        SyncEngineHandle { shutdown_tx, task }
    }

    async fn run(self: Arc<Self>, mut shutdown_rx: mpsc::Receiver<()>) {
        let periodic = self.config.sync_interval_secs > 0;
        info!(
            interval_secs = self.config.sync_interval_secs,
            periodic, "Sync engine background task starting"
        );

        let connectivity = self.store.connectivity();
        let mut online_rx = connectivity.subscribe();
        let mut watching = true;

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.sync_interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick(), if periodic => {
                    self.opportunistic_sync().await;
                }

                changed = online_rx.changed(), if watching => {
                    match changed {
                        Ok(()) => {
                            let online = *online_rx.borrow_and_update();
                            self.store
                                .events()
                                .publish(StoreEvent::ConnectivityChanged(online));
                            if online {
                                info!("Connectivity restored; starting opportunistic sync");
                                self.opportunistic_sync().await;
                            }
                        }
                        Err(_) => {
                            warn!("Connectivity provider dropped; transition syncs disabled");
                            watching = false;
                        }
                    }
                }

                _ = shutdown_rx.recv() => {
                    info!("Sync engine background task stopping");
                    break;
                }
            }
        }
    }

    /// One background cycle attempt; skips quietly when a cycle is
    /// active or connectivity is down.
    async fn opportunistic_sync(&self) {
        if self.cycle_active.load(Ordering::Acquire) {
            debug!("Sync cycle already active; skipping");
            return;
        }
        if !self.store.connectivity().is_online() {
            debug!("Offline; skipping background sync");
            return;
        }

        match self.start_sync().await {
            Ok(report) if !report.success => {
                warn!(
                    errors = report.errors.len(),
                    synced = report.synced_items,
                    "Background sync finished with errors"
                );
            }
            Ok(_) => {}
            Err(SyncError::AlreadyRunning) | Err(SyncError::Offline) => {}
            Err(e) => warn!(error = %e, "Background sync failed"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use atlas_core::{ConflictResolution, OrderStatus, Transaction};
    use atlas_store::{ManualConnectivity, MemoryEngine, OrderService, RemoteApi, RemoteError};
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;

    // =========================================================================
    // Test doubles
    // =========================================================================

    /// Remote that records every attempt and fails for scripted ids.
    struct ScriptedRemote {
        fail_ids: Mutex<HashSet<String>>,
        fail_all: Mutex<bool>,
        attempts: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl ScriptedRemote {
        fn new() -> Arc<Self> {
            Arc::new(ScriptedRemote {
                fail_ids: Mutex::new(HashSet::new()),
                fail_all: Mutex::new(false),
                attempts: Mutex::new(Vec::new()),
                delay: None,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(ScriptedRemote {
                fail_ids: Mutex::new(HashSet::new()),
                fail_all: Mutex::new(false),
                attempts: Mutex::new(Vec::new()),
                delay: Some(delay),
            })
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteApi for ScriptedRemote {
        async fn push_transaction(&self, transaction: &Transaction) -> Result<(), RemoteError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.attempts.lock().unwrap().push(transaction.id.clone());
            if *self.fail_all.lock().unwrap()
                || self.fail_ids.lock().unwrap().contains(&transaction.id)
            {
                return Err(RemoteError::Network("connection reset".to_string()));
            }
            Ok(())
        }
    }

    /// Test logging: `RUST_LOG=debug cargo test -- --nocapture`.
    fn init_tracing() {
        use std::sync::Once;
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }

    async fn harness(
        online: bool,
        remote: Arc<ScriptedRemote>,
        config: SyncConfig,
    ) -> (Arc<SyncEngine>, Arc<LocalStore>, Arc<ManualConnectivity>) {
        init_tracing();
        let connectivity = ManualConnectivity::new(online);
        let store = LocalStore::open(
            Arc::new(MemoryEngine::with_default_collections()),
            connectivity.clone(),
            remote,
        )
        .await
        .unwrap();
        (SyncEngine::new(store.clone(), config), store, connectivity)
    }

    fn test_config(batch_size: usize) -> SyncConfig {
        SyncConfig {
            batch_size,
            sync_interval_secs: 0,
            ..SyncConfig::default()
        }
    }

    /// Queues `n` transactions while offline, then flips online.
    async fn queue_offline(
        store: &LocalStore,
        connectivity: &ManualConnectivity,
        n: usize,
    ) -> Vec<String> {
        connectivity.set_online(false);
        let mut ids = Vec::new();
        for i in 0..n {
            let tx = store
                .commit(vec![Operation::create(
                    "orders",
                    format!("o-{i}"),
                    json!({"id": format!("o-{i}")}),
                )])
                .await
                .unwrap();
            ids.push(tx.id);
        }
        connectivity.set_online(true);
        ids
    }

    // =========================================================================
    // Cycle tests
    // =========================================================================

    #[tokio::test]
    async fn test_empty_queue_sync_is_idempotent_and_silent() {
        let remote = ScriptedRemote::new();
        let (engine, _, _) = harness(true, remote.clone(), test_config(50)).await;

        let report = engine.start_sync().await.unwrap();

        assert!(report.success);
        assert_eq!(report.synced_items, 0);
        assert!(report.errors.is_empty());
        assert!(remote.attempts().is_empty(), "no network calls on empty queue");
    }

    #[tokio::test]
    async fn test_offline_sync_refused_without_queue_mutation() {
        let remote = ScriptedRemote::new();
        let (engine, store, connectivity) = harness(true, remote.clone(), test_config(50)).await;

        queue_offline(&store, &connectivity, 2).await;
        connectivity.set_online(false);

        let err = engine.start_sync().await.unwrap_err();
        assert!(matches!(err, SyncError::Offline));
        assert_eq!(store.sync_status().pending_changes, 2);
        assert!(remote.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_drain_removes_synced_transactions() {
        let remote = ScriptedRemote::new();
        let (engine, store, connectivity) = harness(true, remote.clone(), test_config(2)).await;

        let ids = queue_offline(&store, &connectivity, 5).await;

        let report = engine.start_sync().await.unwrap();

        assert!(report.success);
        assert_eq!(report.synced_items, 5);
        assert_eq!(store.sync_status().pending_changes, 0);
        assert!(store.queued_transactions().await.unwrap().is_empty());
        // oldest first
        assert_eq!(remote.attempts(), ids);
    }

    #[tokio::test]
    async fn test_batch_local_abort_with_cross_batch_continuation() {
        let remote = ScriptedRemote::new();
        let (engine, store, connectivity) = harness(true, remote.clone(), test_config(2)).await;

        // Batches: [t0, t1], [t2, t3]. Fail t0.
        let ids = queue_offline(&store, &connectivity, 4).await;
        remote.fail_ids.lock().unwrap().insert(ids[0].clone());

        let report = engine.start_sync().await.unwrap();

        // t1 was skipped (same batch as t0); t2 and t3 synced anyway.
        assert!(!report.success);
        assert_eq!(report.synced_items, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            remote.attempts(),
            vec![ids[0].clone(), ids[2].clone(), ids[3].clone()]
        );

        // Failed + skipped transactions remain queued for the next cycle.
        let still_queued: Vec<String> = store
            .queued_transactions()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(still_queued, vec![ids[0].clone(), ids[1].clone()]);

        // Status carries the error until a clean cycle wipes it.
        assert_eq!(store.sync_status().sync_errors.len(), 1);

        remote.fail_ids.lock().unwrap().clear();
        let report = engine.start_sync().await.unwrap();
        assert!(report.success);
        assert_eq!(report.synced_items, 2);
        assert!(store.sync_status().sync_errors.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_cycles_are_exclusive() {
        let remote = ScriptedRemote::slow(Duration::from_millis(50));
        let (engine, store, connectivity) = harness(true, remote, test_config(50)).await;

        queue_offline(&store, &connectivity, 1).await;

        let (first, second) = tokio::join!(engine.start_sync(), engine.start_sync());

        // Exactly one ran to completion; the other failed fast.
        let outcomes = [first.is_ok(), second.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);

        let failure = if first.is_err() {
            first.unwrap_err()
        } else {
            second.unwrap_err()
        };
        assert!(matches!(failure, SyncError::AlreadyRunning));

        // And the engine is reusable afterwards.
        assert!(engine.start_sync().await.is_ok());
    }

    // =========================================================================
    // Conflict tests
    // =========================================================================

    #[tokio::test]
    async fn test_merge_resolution_written_back_through_coordinator() {
        let remote = ScriptedRemote::new();
        let (engine, store, _) = harness(true, remote, test_config(50)).await;

        let t1 = Utc::now() - chrono::Duration::seconds(120);
        let t2 = Utc::now();
        let local = json!({
            "id": "o-1", "createdAt": t1, "updatedAt": t1, "version": 2,
            "status": "pending",
        });
        let remote_record = json!({
            "id": "o-1", "createdAt": t1, "updatedAt": t2, "version": 5,
            "status": "preparing",
        });

        // Seed the local record so the write-back updates it.
        store
            .commit(vec![Operation::create("orders", "o-1", local.clone())])
            .await
            .unwrap();

        let winner = engine
            .resolve_conflict(&Conflict {
                collection: "orders".to_string(),
                local,
                remote: remote_record,
                resolution: ConflictResolution::Merge,
            })
            .await
            .unwrap();

        // Remote was newer: adopted wholesale, version = max(2, 5) + 1.
        assert_eq!(winner["status"], "preparing");
        assert_eq!(winner["version"], 6);

        let stored = store.get_raw("orders", "o-1").await.unwrap().unwrap();
        assert_eq!(stored, winner);
    }

    // =========================================================================
    // Background cadence tests
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_online_transition_drains_queue_end_to_end() {
        let remote = ScriptedRemote::new();
        let (engine, store, connectivity) = harness(false, remote.clone(), test_config(50)).await;
        let orders = OrderService::new(store.clone());

        // Place an order with two items while offline.
        let order = orders
            .create_order(
                vec![
                    atlas_core::OrderItem {
                        product_id: "p-espresso".to_string(),
                        name: "Espresso".to_string(),
                        quantity: 2,
                        unit_price_cents: 350,
                        line_total_cents: 0,
                        customizations: Vec::new(),
                        special_requests: None,
                    },
                    atlas_core::OrderItem {
                        product_id: "p-croissant".to_string(),
                        name: "Croissant".to_string(),
                        quantity: 1,
                        unit_price_cents: 499,
                        line_total_cents: 0,
                        customizations: Vec::new(),
                        special_requests: None,
                    },
                ],
                None,
                None,
                None,
            )
            .await
            .unwrap();

        assert_eq!(order.meta.version, 1);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(store.sync_status().pending_changes, 1);
        assert!(remote.attempts().is_empty());

        // Background engine is idle (periodic sync disabled) until the
        // connectivity transition wakes it.
        let handle = engine.spawn();
        tokio::time::sleep(Duration::from_millis(10)).await;
        connectivity.set_online(true);

        // Wait for the opportunistic cycle to drain the queue.
        let mut drained = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if store.sync_status().pending_changes == 0 {
                drained = true;
                break;
            }
        }
        assert!(drained, "background sync never drained the queue");

        assert!(store.queued_transactions().await.unwrap().is_empty());
        assert_eq!(remote.attempts().len(), 1);
        assert!(store.sync_status().last_sync.is_some());

        // Sync must not touch domain state: the order is still pending,
        // still version 1.
        let after = store
            .get::<atlas_core::Order>("orders", &order.meta.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.status, OrderStatus::Pending);
        assert_eq!(after.meta.version, 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_cadence_retries_on_interval() {
        let remote = ScriptedRemote::new();
        let config = SyncConfig {
            batch_size: 50,
            sync_interval_secs: 30,
            ..SyncConfig::default()
        };
        let (engine, store, _) = harness(true, remote.clone(), config).await;

        // Commit while online with the remote down: the inline push
        // fails and the transaction lands in the queue. Connectivity
        // never flips, so only the interval can drain it.
        *remote.fail_all.lock().unwrap() = true;
        store
            .commit(vec![Operation::create("orders", "x", json!({"id": "x"}))])
            .await
            .unwrap();
        assert_eq!(store.sync_status().pending_changes, 1);

        let handle = engine.spawn();
        *remote.fail_all.lock().unwrap() = false;

        // Within one interval (plus slack) the periodic cycle retries.
        let mut drained = false;
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if store.sync_status().pending_changes == 0 {
                drained = true;
                break;
            }
        }
        assert!(drained, "periodic sync never retried the queued transaction");

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_zero_disables_periodic_sync() {
        let remote = ScriptedRemote::new();
        let (engine, store, _) = harness(true, remote.clone(), test_config(50)).await;

        *remote.fail_all.lock().unwrap() = true;
        store
            .commit(vec![Operation::create("orders", "x", json!({"id": "x"}))])
            .await
            .unwrap();
        *remote.fail_all.lock().unwrap() = false;

        let handle = engine.spawn();
        tokio::time::sleep(Duration::from_secs(300)).await;

        // No interval, no transition: the queue must still be intact.
        assert_eq!(store.sync_status().pending_changes, 1);

        handle.shutdown().await;
    }
}
