//! # Conflict Resolution
//!
//! Resolves a local/remote divergence of one record under a policy.
//! Resolution is pure and deterministic; the engine writes the winner
//! back through the transaction coordinator afterwards.
//!
//! ## Policies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Resolution Policies                                │
//! │                                                                         │
//! │  local   → keep the local record, untouched                             │
//! │  remote  → adopt the remote record, untouched                           │
//! │  merge   → whole-record last-writer-wins:                               │
//! │              winner  = later updatedAt (local wins ties)                │
//! │              version = max(local.version, remote.version) + 1           │
//! │                                                                         │
//! │  "merge" is NOT field-level merging. The winning record is adopted      │
//! │  wholesale; only its version is rewritten so both replicas agree the    │
//! │  resolved record supersedes everything either of them has seen.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::Value;
use tracing::debug;

use atlas_core::{record, Conflict, ConflictResolution, RecordError};

/// Resolves a conflict into the record that should win.
pub fn resolve(conflict: &Conflict) -> Result<Value, RecordError> {
    match conflict.resolution {
        ConflictResolution::Local => Ok(conflict.local.clone()),
        ConflictResolution::Remote => Ok(conflict.remote.clone()),
        ConflictResolution::Merge => {
            let local = record::meta_of(&conflict.local)?;
            let remote = record::meta_of(&conflict.remote)?;

            let remote_wins = remote.updated_at > local.updated_at;
            let mut winner = if remote_wins {
                conflict.remote.clone()
            } else {
                conflict.local.clone()
            };

            let version = local.version.max(remote.version) + 1;
            record::set_version(&mut winner, version)?;

            debug!(
                id = %local.id,
                collection = %conflict.collection,
                remote_wins,
                version,
                "Merged conflict (last-writer-wins)"
            );

            Ok(winner)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
