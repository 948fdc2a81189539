//! # Connectivity Provider
//!
//! Connectivity is an injected capability, not ambient global state:
//! the store's fallback routing and the sync engine's cadence both ask
//! this trait, and tests flip it at will.
//!
//! ## Who Consumes It
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Connectivity Consumers                               │
//! │                                                                         │
//! │  LocalStore::commit ──► is_online()?                                    │
//! │       online  → push the transaction inline                             │
//! │       offline → append it to the durable sync queue                     │
//! │                                                                         │
//! │  SyncEngine background task ──► subscribe()                             │
//! │       offline→online transition → opportunistic sync cycle              │
//! │                                                                         │
//! │  Production wires whatever the platform offers (an OS reachability      │
//! │  callback, a heartbeat prober) into a ManualConnectivity.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

// =============================================================================
// Trait
// =============================================================================

/// A boolean "is online" source plus transition notifications.
pub trait ConnectivityProvider: Send + Sync {
    /// Current connectivity.
    fn is_online(&self) -> bool;

    /// Subscribes to transitions. The receiver yields the new state.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

// =============================================================================
// Manual provider
// =============================================================================

/// A connectivity provider driven by explicit `set_online` calls.
///
/// The production integration point (platform reachability callbacks
/// feed it) and the test switch.
#[derive(Debug)]
pub struct ManualConnectivity {
    tx: watch::Sender<bool>,
}

impl ManualConnectivity {
    /// Creates a provider with the given initial state.
    pub fn new(online: bool) -> Arc<Self> {
        let (tx, _) = watch::channel(online);
        Arc::new(ManualConnectivity { tx })
    }

    /// Flips connectivity; subscribers are notified on change.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current != online {
                *current = online;
                true
            } else {
                false
            }
        });
        if changed {
            info!(online, "Connectivity changed");
        }
    }
}

impl ConnectivityProvider for ManualConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
