//! # Print Jobs
//!
//! The durable unit of background work: a print request with a
//! priority, bounded retries, and terminal states kept for audit.
//!
//! ## Job State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Print Job State Machine                           │
//! │                                                                         │
//! │   enqueue                                                               │
//! │      │                                                                  │
//! │      ▼          pop            success                                  │
//! │  ┌────────┐ ─────────► ┌────────────┐ ─────────► ┌───────────┐          │
//! │  │ queued │            │ processing │            │ completed │ terminal │
//! │  └────────┘ ◄───────── └────────────┘            └───────────┘          │
//! │      ▲        failure,      │                                           │
//! │      │        retries left  │ failure, retryCount == maxRetries         │
//! │      │        (wait 2^n)    ▼                                           │
//! │      │                 ┌────────┐                                       │
//! │      └──────────────── │ failed │ terminal                              │
//! │       manual retry     └────────┘                                       │
//! │       (retryCount = 0)                                                  │
//! │                                                                         │
//! │  Jobs are NEVER deleted: terminal jobs stay in print_jobs so the        │
//! │  printed/not-printed history can be reconciled after the fact.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::record::RecordMeta;

/// Retry budget applied when the caller doesn't specify one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

// =============================================================================
// Priority
// =============================================================================

/// Dequeue priority.
///
/// Variant order IS the dequeue order: the derived `Ord` sorts `Urgent`
/// first and `Low` last, with creation time breaking ties (stable FIFO).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    /// Jump the whole queue (e.g. a re-fired receipt at the counter).
    Urgent,
    /// Ahead of routine work.
    High,
    /// Default.
    Normal,
    /// Whenever the queue is otherwise empty.
    Low,
}

impl Default for JobPriority {
    fn default() -> Self {
        JobPriority::Normal
    }
}

// =============================================================================
// Status
// =============================================================================

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for the worker.
    Queued,
    /// Being printed right now (at most one job system-wide).
    Processing,
    /// Printed (terminal).
    Completed,
    /// Retry budget exhausted (terminal; only a manual retry exits it).
    Failed,
}

impl JobStatus {
    /// True for states no automatic transition leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// One line on a kitchen or bar ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketLine {
    /// Product name as ordered.
    pub name: String,

    /// Quantity.
    pub quantity: i64,

    /// Free-text requests, printed under the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

/// What a job prints, one variant per job type.
///
/// Each variant carries only the fields its downstream renderer needs
/// and is validated at enqueue time, so a malformed job can never reach
/// the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum PrintPayload {
    /// Customer receipt.
    Receipt {
        order_id: String,
        total_cents: i64,
    },
    /// Kitchen ticket.
    Kitchen {
        order_id: String,
        items: Vec<TicketLine>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    /// Bar ticket.
    Bar {
        order_id: String,
        items: Vec<TicketLine>,
    },
}

impl PrintPayload {
    /// Job type tag ("receipt", "kitchen", "bar").
    pub fn kind(&self) -> &'static str {
        match self {
            PrintPayload::Receipt { .. } => "receipt",
            PrintPayload::Kitchen { .. } => "kitchen",
            PrintPayload::Bar { .. } => "bar",
        }
    }

    /// Validates the payload before it is allowed into the queue.
    pub fn validate(&self) -> ValidationResult<()> {
        match self {
            PrintPayload::Receipt {
                order_id,
                total_cents,
            } => {
                require_id(order_id)?;
                if *total_cents < 0 {
                    return Err(ValidationError::MustBePositive {
                        field: "totalCents".to_string(),
                    });
                }
                Ok(())
            }
            PrintPayload::Kitchen { order_id, items, .. }
            | PrintPayload::Bar { order_id, items } => {
                require_id(order_id)?;
                validate_lines(items)
            }
        }
    }
}

fn require_id(order_id: &str) -> ValidationResult<()> {
    if order_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "orderId".to_string(),
        });
    }
    Ok(())
}

fn validate_lines(items: &[TicketLine]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }
    for line in items {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Print Job
// =============================================================================

/// A durable print job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    /// Record envelope (id, timestamps, version, tombstone).
    #[serde(flatten)]
    pub meta: RecordMeta,

    /// Dequeue priority.
    pub priority: JobPriority,

    /// Lifecycle state.
    pub status: JobStatus,

    /// Failed attempts so far.
    pub retry_count: u32,

    /// Retry budget; reaching it moves the job to `failed`.
    pub max_retries: u32,

    /// Message from the last failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// What to print.
    pub payload: PrintPayload,
}

impl PrintJob {
    /// Job type tag, derived from the payload.
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_is_dequeue_order() {
        let mut priorities = vec![
            JobPriority::Normal,
            JobPriority::Urgent,
            JobPriority::Low,
            JobPriority::High,
        ];
        priorities.sort();

        assert_eq!(
            priorities,
            vec![
                JobPriority::Urgent,
                JobPriority::High,
                JobPriority::Normal,
                JobPriority::Low,
            ]
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn test_payload_tagging() {
        let payload = PrintPayload::Receipt {
            order_id: "o-1".to_string(),
            total_cents: 1199,
        };
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["type"], "receipt");
        assert_eq!(value["orderId"], "o-1");
        assert_eq!(value["totalCents"], 1199);
    }

    #[test]
    fn test_payload_validation() {
        let ok = PrintPayload::Kitchen {
            order_id: "o-1".to_string(),
            items: vec![TicketLine {
                name: "Espresso".to_string(),
                quantity: 2,
                special_requests: None,
            }],
            notes: None,
        };
        assert!(ok.validate().is_ok());

        let empty = PrintPayload::Kitchen {
            order_id: "o-1".to_string(),
            items: Vec::new(),
            notes: None,
        };
        assert!(empty.validate().is_err());

        let blank_order = PrintPayload::Receipt {
            order_id: "  ".to_string(),
            total_cents: 100,
        };
        assert!(blank_order.validate().is_err());
    }
}
