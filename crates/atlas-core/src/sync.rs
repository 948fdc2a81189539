//! # Sync Types
//!
//! Pure data describing synchronization state: the process-wide status
//! snapshot, the per-cycle report, and record conflicts with their
//! resolution policies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Sync Status
// =============================================================================

/// Process-wide view of synchronization state.
///
/// `pending_changes` mirrors the size of the durable sync queue;
/// `sync_errors` accumulates error strings from failed pushes until the
/// next successful full drain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// When a sync cycle last completed.
    pub last_sync: Option<DateTime<Utc>>,

    /// Committed transactions still awaiting remote acknowledgment.
    pub pending_changes: usize,

    /// Current connectivity, as reported by the injected provider.
    pub is_online: bool,

    /// Accumulated sync error messages.
    pub sync_errors: Vec<String>,
}

// =============================================================================
// Sync Report
// =============================================================================

/// Outcome of one sync cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// True when every attempted transaction was acknowledged.
    pub success: bool,

    /// Number of transactions acknowledged and dequeued this cycle.
    pub synced_items: usize,

    /// One entry per failed batch (the failure that aborted it).
    pub errors: Vec<String>,

    /// When the cycle finished.
    pub timestamp: DateTime<Utc>,
}

impl SyncReport {
    /// A successful report covering `synced_items` transactions.
    pub fn success(synced_items: usize) -> Self {
        SyncReport {
            success: true,
            synced_items,
            errors: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// Conflicts
// =============================================================================

/// Policy for resolving a local/remote divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolution {
    /// Keep the local record as-is.
    Local,
    /// Adopt the remote record as-is.
    Remote,
    /// Last-writer-wins on `updatedAt` at whole-record granularity,
    /// stamped with `version = max(local, remote) + 1`.
    ///
    /// NOT a field-level merge, despite the name. The original system
    /// shipped this exact behavior and downstream consumers rely on it.
    Merge,
}

/// A detected divergence between the local and remote version of one
/// record, plus the policy to resolve it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    /// Collection both versions belong to.
    pub collection: String,

    /// The record as the local store has it.
    pub local: Value,

    /// The record as the remote endpoint has it.
    pub remote: Value,

    /// How to resolve.
    pub resolution: ConflictResolution,
}

// =============================================================================
// Unit Tests
// =============================================================================
