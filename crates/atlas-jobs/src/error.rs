//! # Job Error Types
//!
//! Errors for the print-job queue. A job's own *processing* failures
//! are not errors in this sense; they are captured into the job's
//! `error_message`/`retry_count` and drive the retry state machine.
//! These types cover misuse of the queue API and store failures
//! underneath it.

use thiserror::Error;

use atlas_core::JobStatus;

/// Result type alias for job-queue operations.
pub type JobResult<T> = Result<T, JobError>;

/// Job-queue error type.
#[derive(Debug, Error)]
pub enum JobError {
    /// No job with this id exists.
    #[error("print job not found: {0}")]
    NotFound(String),

    /// Manual retry is only legal from the `failed` state.
    #[error("job {id} is {status:?}; only failed jobs can be retried")]
    NotRetryable { id: String, status: JobStatus },

    /// The payload failed validation at enqueue time.
    #[error("invalid print payload: {0}")]
    InvalidPayload(#[from] atlas_core::ValidationError),

    /// A job record could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store failed underneath the queue.
    #[error(transparent)]
    Store(#[from] atlas_store::StoreError),
}
