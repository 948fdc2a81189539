//! # Transactions
//!
//! An atomic batch of create/update/delete operations, committed as one
//! unit against the local store and later shipped as one unit to the
//! remote endpoint.
//!
//! ## Transaction Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Transaction Lifecycle                              │
//! │                                                                         │
//! │  UI command (create order, update status, enqueue print job)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Transaction { status: Pending, operations: [...] }                     │
//! │       │                                                                 │
//! │       ├── atomic apply fails ──► status: RolledBack (terminal)          │
//! │       │                          store unchanged, error surfaced        │
//! │       ▼                                                                 │
//! │  status: Committed (terminal) ── visible to every read immediately      │
//! │       │                                                                 │
//! │       ├── offline ──► appended to sync_queue, drained later             │
//! │       └── online  ──► pushed inline; on failure, queued instead         │
//! │                                                                         │
//! │  NOTE: "committed" is a LOCAL outcome. Whether the transaction has      │
//! │  been acknowledged remotely is tracked by sync-queue membership,        │
//! │  never by this status.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The serialized shape (`{id, operations[], timestamp, status}`) is the
//! body of `POST {api_base_url}/sync`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// =============================================================================
// Operations
// =============================================================================

/// What a single operation does to its target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Insert a new record.
    Create,
    /// Replace an existing record with a new value.
    Update,
    /// Remove a record.
    Delete,
}

/// One atomic unit inside a transaction.
///
/// `previous` carries the value the record had before this operation
/// (for updates and deletes). It is not needed to apply the operation
/// (the engine's atomic write takes care of all-or-nothing), but it is
/// kept for audit and feeds conflict resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation kind. Serialized as `type` on the wire.
    #[serde(rename = "type")]
    pub kind: OperationKind,

    /// Target collection.
    pub collection: String,

    /// Target record id.
    pub id: String,

    /// The new value (create/update).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// The prior value (update/delete). Serialized as `previousData`.
    #[serde(
        rename = "previousData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub previous: Option<Value>,
}

impl Operation {
    /// Builds a create operation.
    pub fn create(collection: impl Into<String>, id: impl Into<String>, data: Value) -> Self {
        Operation {
            kind: OperationKind::Create,
            collection: collection.into(),
            id: id.into(),
            data: Some(data),
            previous: None,
        }
    }

    /// Builds an update operation carrying the prior value.
    pub fn update(
        collection: impl Into<String>,
        id: impl Into<String>,
        data: Value,
        previous: Value,
    ) -> Self {
        Operation {
            kind: OperationKind::Update,
            collection: collection.into(),
            id: id.into(),
            data: Some(data),
            previous: Some(previous),
        }
    }

    /// Builds a delete operation carrying the prior value.
    pub fn delete(
        collection: impl Into<String>,
        id: impl Into<String>,
        previous: Value,
    ) -> Self {
        Operation {
            kind: OperationKind::Delete,
            collection: collection.into(),
            id: id.into(),
            data: None,
            previous: Some(previous),
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Local commit outcome of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Built but not yet applied.
    Pending,
    /// Applied to the local store (terminal).
    Committed,
    /// Apply failed; the store is unchanged (terminal).
    RolledBack,
}

/// An ordered, atomic batch of operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique transaction id (UUID v4).
    pub id: String,

    /// Operations, applied in the order supplied.
    pub operations: Vec<Operation>,

    /// When the transaction was created.
    pub timestamp: DateTime<Utc>,

    /// Local commit outcome.
    pub status: TransactionStatus,
}

impl Transaction {
    /// Builds a pending transaction around a batch of operations.
    pub fn new(operations: Vec<Operation>) -> Self {
        Transaction {
            id: Uuid::new_v4().to_string(),
            operations,
            timestamp: Utc::now(),
            status: TransactionStatus::Pending,
        }
    }

    /// True if any operation in the batch targets the given collection.
    pub fn touches(&self, collection: &str) -> bool {
        self.operations.iter().any(|op| op.collection == collection)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Committed).unwrap(),
            "\"committed\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionStatus::RolledBack).unwrap(),
            "\"rolledback\""
        );
    }

    #[test]
    fn test_operation_wire_shape() {
        let op = Operation::update("orders", "o-1", json!({"a": 1}), json!({"a": 0}));
        let value = serde_json::to_value(&op).unwrap();

        assert_eq!(value["type"], "update");
        assert_eq!(value["collection"], "orders");
        assert_eq!(value["previousData"], json!({"a": 0}));
    }

    #[test]
    fn test_create_has_no_previous() {
        let op = Operation::create("products", "p-1", json!({"name": "Espresso"}));
        let value = serde_json::to_value(&op).unwrap();

        assert!(value.get("previousData").is_none());
    }

    #[test]
    fn test_new_transaction_is_pending() {
        let tx = Transaction::new(vec![Operation::create("orders", "o-1", json!({}))]);

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.touches("orders"));
        assert!(!tx.touches("products"));
    }
}
