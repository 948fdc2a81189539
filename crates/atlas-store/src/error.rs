//! # Store Error Types
//!
//! Error types for storage and commit operations.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Store Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐  │
//! │  │    Storage      │  │     Commit      │  │       Records           │  │
//! │  │                 │  │                 │  │                         │  │
//! │  │  Database       │  │  Transaction    │  │  Serialization          │  │
//! │  │  Unknown        │  │  Failed         │  │  MalformedRecord        │  │
//! │  │  Collection     │  │  (rolled back)  │  │  NotFound               │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘  │
//! │                                                                         │
//! │  A TransactionFailed always means the store is UNCHANGED: the           │
//! │  atomic write was aborted before anything became observable.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error type covering storage and commit failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The target collection is not registered with the engine.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// The underlying storage engine failed.
    #[error("database error: {0}")]
    Database(String),

    /// A record could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record doesn't carry a valid envelope.
    #[error("malformed record in {collection}: {source}")]
    MalformedRecord {
        collection: String,
        #[source]
        source: atlas_core::RecordError,
    },

    /// A record the operation requires does not exist.
    #[error("record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// An operation in a batch is malformed (e.g. a create without data).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A commit failed and was rolled back; the store is unchanged.
    #[error("transaction {id} rolled back: {source}")]
    TransactionFailed {
        id: String,
        #[source]
        source: Box<StoreError>,
    },

    /// Input validation failed before anything was persisted.
    #[error("validation error: {0}")]
    Validation(#[from] atlas_core::ValidationError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_failed_message_carries_cause() {
        let err = StoreError::TransactionFailed {
            id: "tx-1".to_string(),
            source: Box::new(StoreError::UnknownCollection("bogus".to_string())),
        };
        assert!(err.to_string().contains("tx-1"));
        assert!(err.to_string().contains("rolled back"));
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::NotFound {
            collection: "orders".to_string(),
            id: "o-1".to_string(),
        };
        assert_eq!(err.to_string(), "record not found: orders/o-1");
    }
}
