//! # Store Events
//!
//! A typed broadcast channel replacing ad-hoc event-emitter strings.
//! The store and the sync engine publish; any number of collaborators
//! (a UI, a metrics sink, a test) subscribe explicitly.
//!
//! Slow subscribers lag rather than block the publisher; missing a
//! notification is always recoverable by re-reading the store, which is
//! the source of truth.

use tokio::sync::broadcast;

use atlas_core::{SyncStatus, Transaction};

/// Buffered events per subscriber before lagging kicks in.
const EVENT_CAPACITY: usize = 64;

// =============================================================================
// Events
// =============================================================================

/// Everything the durability core announces.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A transaction was committed locally (sync state irrelevant).
    TransactionCommitted(Transaction),

    /// The sync status snapshot changed (queue size, last sync, errors).
    SyncStatusChanged(SyncStatus),

    /// Connectivity flipped online (`true`) or offline (`false`).
    ConnectivityChanged(bool),
}

// =============================================================================
// Event Bus
// =============================================================================

/// Broadcast sender with subscribe access.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// Creates a bus with the default capacity.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        EventBus { tx }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event. A bus with no subscribers is fine.
    pub fn publish(&self, event: StoreEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
