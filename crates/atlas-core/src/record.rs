//! # Record Envelope
//!
//! Every persisted entity in Atlas POS carries the same envelope: a
//! stable unique id, creation/update timestamps, a monotonically
//! increasing version, and an optional tombstone flag.
//!
//! ## The Envelope Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Record Envelope Invariants                        │
//! │                                                                         │
//! │  id         UUID v4, assigned once, never reused                        │
//! │  createdAt  set at creation, never changes afterwards                   │
//! │  updatedAt  refreshed on every successful update                        │
//! │  version    starts at 1; +1 on EVERY successful update to the same id   │
//! │             (never decreases, never skips); conflict resolution and    │
//! │             the sync protocol both lean on this                         │
//! │  deleted    tombstone for sync; deleted records still carry a version   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are persisted as JSON values (camelCase keys, matching the
//! sync wire format), so this module also provides envelope extraction
//! from a raw `serde_json::Value` for code that handles records
//! generically: the sync queue, the conflict resolver, the job worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::RecordError;

// =============================================================================
// Collections
// =============================================================================

/// Logical collection names, each keyed by record id.
pub mod collections {
    /// The product catalog.
    pub const PRODUCTS: &str = "products";

    /// Customer orders.
    pub const ORDERS: &str = "orders";

    /// Durable print jobs (never deleted, only transitioned).
    pub const PRINT_JOBS: &str = "print_jobs";

    /// Committed-but-unsynced transactions awaiting remote acknowledgment.
    pub const SYNC_QUEUE: &str = "sync_queue";

    /// Every collection the store is opened with by default.
    pub const ALL: [&str; 4] = [PRODUCTS, ORDERS, PRINT_JOBS, SYNC_QUEUE];
}

// =============================================================================
// Record Metadata
// =============================================================================

/// The envelope carried by every persisted record.
///
/// Embedded into domain types with `#[serde(flatten)]` so the stored
/// JSON keeps the flat camelCase shape the sync endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    /// Unique identifier (UUID v4), stable for the record's lifetime.
    pub id: String,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last successfully updated.
    pub updated_at: DateTime<Utc>,

    /// Monotonic version counter, starts at 1.
    pub version: i64,

    /// Tombstone flag; a deleted record is kept for sync, not erased.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

impl RecordMeta {
    /// Creates a fresh envelope: new UUID, both timestamps now, version 1.
    pub fn generate() -> Self {
        let now = Utc::now();
        RecordMeta {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            version: 1,
            deleted: false,
        }
    }

    /// Marks a successful update: refreshes `updated_at` and bumps
    /// `version` by exactly 1.
    ///
    /// Every mutation path is expected to go through here so the
    /// monotonicity invariant can't drift.
    pub fn bump(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

// =============================================================================
// Envelope extraction from raw values
// =============================================================================

/// Reads the envelope out of a raw stored record.
///
/// ## Errors
/// [`RecordError`] if the value is not an object or any envelope field
/// is missing or malformed.
pub fn meta_of(value: &Value) -> Result<RecordMeta, RecordError> {
    let obj = value.as_object().ok_or(RecordError::InvalidField {
        field: "record",
        reason: "expected a JSON object".to_string(),
    })?;

    let id = obj
        .get("id")
        .ok_or(RecordError::MissingField("id"))?
        .as_str()
        .ok_or(RecordError::InvalidField {
            field: "id",
            reason: "expected a string".to_string(),
        })?
        .to_string();

    let created_at = timestamp_field(obj, "createdAt")?;
    let updated_at = timestamp_field(obj, "updatedAt")?;

    let version = obj
        .get("version")
        .ok_or(RecordError::MissingField("version"))?
        .as_i64()
        .ok_or(RecordError::InvalidField {
            field: "version",
            reason: "expected an integer".to_string(),
        })?;

    let deleted = obj.get("deleted").and_then(Value::as_bool).unwrap_or(false);

    Ok(RecordMeta {
        id,
        created_at,
        updated_at,
        version,
        deleted,
    })
}

/// Overwrites the `version` field of a raw record.
///
/// Used by merge conflict resolution, which adopts one whole record but
/// stamps it with `max(local, remote) + 1`.
pub fn set_version(value: &mut Value, version: i64) -> Result<(), RecordError> {
    let obj = value.as_object_mut().ok_or(RecordError::InvalidField {
        field: "record",
        reason: "expected a JSON object".to_string(),
    })?;
    obj.insert("version".to_string(), Value::from(version));
    Ok(())
}

fn timestamp_field(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<DateTime<Utc>, RecordError> {
    let raw = obj.get(field).ok_or(RecordError::MissingField(field))?;
    serde_json::from_value(raw.clone()).map_err(|e| RecordError::InvalidField {
        field,
        reason: e.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_starts_at_version_one() {
        let meta = RecordMeta::generate();
        assert_eq!(meta.version, 1);
        assert_eq!(meta.created_at, meta.updated_at);
        assert!(!meta.deleted);
    }

    #[test]
    fn test_bump_increments_by_exactly_one() {
        let mut meta = RecordMeta::generate();
        let created = meta.created_at;

        for expected in 2..=5 {
            meta.bump();
            assert_eq!(meta.version, expected);
        }

        // created_at never moves
        assert_eq!(meta.created_at, created);
        assert!(meta.updated_at >= created);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = RecordMeta::generate();
        let value = serde_json::to_value(&meta).unwrap();

        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        // tombstone flag elided while false
        assert!(value.get("deleted").is_none());
    }

    #[test]
    fn test_meta_of_round_trip() {
        let meta = RecordMeta::generate();
        let mut value = serde_json::to_value(&meta).unwrap();
        value["name"] = json!("Espresso"); // domain fields are ignored

        let extracted = meta_of(&value).unwrap();
        assert_eq!(extracted, meta);
    }

    #[test]
    fn test_meta_of_rejects_missing_fields() {
        let err = meta_of(&json!({ "id": "abc" })).unwrap_err();
        assert!(matches!(err, RecordError::MissingField("createdAt")));

        let err = meta_of(&json!("not an object")).unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { .. }));
    }

    #[test]
    fn test_set_version() {
        let meta = RecordMeta::generate();
        let mut value = serde_json::to_value(&meta).unwrap();

        set_version(&mut value, 7).unwrap();
        assert_eq!(meta_of(&value).unwrap().version, 7);
    }
}
