//! # Print Queue
//!
//! The durable, priority-ordered queue of print jobs. Enqueue, list,
//! and manual retry live here; the processing loop is in
//! [`crate::worker`].
//!
//! ## Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dequeue Ordering                                 │
//! │                                                                         │
//! │  enqueued:  normal₁  urgent₂  low₃  urgent₄  high₅                      │
//! │                                                                         │
//! │  dequeued:  urgent₂  urgent₄  high₅  normal₁  low₃                      │
//! │             └─ priority rank first, creation order within a rank ─┘     │
//! │                                                                         │
//! │  The tie-break is the record's createdAt timestamp, which the           │
//! │  envelope stamps once at enqueue: a stable FIFO within each rank.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tracing::{debug, info};

use atlas_core::{
    collections, JobPriority, JobStatus, Operation, PrintJob, PrintPayload, RecordMeta,
    DEFAULT_MAX_RETRIES,
};
use atlas_store::LocalStore;

use crate::error::{JobError, JobResult};

// =============================================================================
// Print Queue
// =============================================================================

/// Command/read surface over the durable print-job queue.
#[derive(Clone)]
pub struct PrintQueue {
    store: Arc<LocalStore>,
    max_retries: u32,
}

impl PrintQueue {
    /// Creates a queue with the default retry budget.
    pub fn new(store: Arc<LocalStore>) -> Self {
        PrintQueue {
            store,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Overrides the retry budget applied to new jobs.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Validates and persists a new job in the `queued` state.
    pub async fn enqueue(
        &self,
        priority: JobPriority,
        payload: PrintPayload,
    ) -> JobResult<PrintJob> {
        payload.validate()?;

        let job = PrintJob {
            meta: RecordMeta::generate(),
            priority,
            status: JobStatus::Queued,
            retry_count: 0,
            max_retries: self.max_retries,
            error_message: None,
            payload,
        };

        info!(
            id = %job.meta.id,
            kind = job.kind(),
            priority = ?priority,
            "Enqueueing print job"
        );

        self.store
            .commit(vec![Operation::create(
                collections::PRINT_JOBS,
                job.meta.id.clone(),
                serde_json::to_value(&job)?,
            )])
            .await?;

        Ok(job)
    }

    /// Gets one job by id.
    pub async fn get(&self, job_id: &str) -> JobResult<Option<PrintJob>> {
        Ok(self.store.get(collections::PRINT_JOBS, job_id).await?)
    }

    /// Lists jobs in dequeue order (priority rank, then creation time),
    /// optionally filtered by status.
    ///
    /// Jobs are never deleted, so with no filter this is the full audit
    /// history including terminal jobs.
    pub async fn list(&self, status: Option<JobStatus>) -> JobResult<Vec<PrintJob>> {
        let mut jobs: Vec<PrintJob> = self
            .store
            .query(collections::PRINT_JOBS, |job: &PrintJob| {
                status.map_or(true, |s| job.status == s)
            })
            .await?;

        jobs.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.meta.created_at.cmp(&b.meta.created_at))
        });

        Ok(jobs)
    }

    /// The job the worker should print next, if any.
    pub async fn next_queued(&self) -> JobResult<Option<PrintJob>> {
        Ok(self.list(Some(JobStatus::Queued)).await?.into_iter().next())
    }

    /// Manually resurrects a terminally failed job.
    ///
    /// Only legal from `failed`: the job returns to `queued` with a
    /// fresh retry budget and a cleared error.
    pub async fn retry(&self, job_id: &str) -> JobResult<PrintJob> {
        let job = self
            .get(job_id)
            .await?
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        if job.status != JobStatus::Failed {
            return Err(JobError::NotRetryable {
                id: job_id.to_string(),
                status: job.status,
            });
        }

        info!(id = %job_id, "Manually retrying failed print job");

        self.update_job(&job, |j| {
            j.status = JobStatus::Queued;
            j.retry_count = 0;
            j.error_message = None;
        })
        .await
    }

    /// Commits a job mutation as one atomic update (version bump
    /// included). The worker's transitions and manual retry both land
    /// here so every job change is shaped the same way.
    pub(crate) async fn update_job<F>(&self, current: &PrintJob, mutate: F) -> JobResult<PrintJob>
    where
        F: FnOnce(&mut PrintJob),
    {
        let mut updated = current.clone();
        mutate(&mut updated);
        updated.meta.bump();

        debug!(
            id = %current.meta.id,
            from = ?current.status,
            to = ?updated.status,
            retry_count = updated.retry_count,
            "Transitioning print job"
        );

        self.store
            .commit(vec![Operation::update(
                collections::PRINT_JOBS,
                current.meta.id.clone(),
                serde_json::to_value(&updated)?,
                serde_json::to_value(current)?,
            )])
            .await?;

        Ok(updated)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{memory_queue, receipt};

    #[tokio::test]
    async fn test_enqueue_initial_state() {
        let (queue, _) = memory_queue().await;

        let job = queue
            .enqueue(JobPriority::Normal, receipt("o-1"))
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.retry_count, 0);
        assert_eq!(job.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(job.meta.version, 1);
        assert!(job.error_message.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_rejects_invalid_payload() {
        let (queue, _) = memory_queue().await;

        let err = queue
            .enqueue(JobPriority::Normal, receipt("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidPayload(_)));

        // Nothing was persisted.
        assert!(queue.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_priority_then_fifo_ordering() {
        let (queue, _) = memory_queue().await;

        // Enqueue order: normal, urgent, low, urgent, high.
        let normal = queue.enqueue(JobPriority::Normal, receipt("n")).await.unwrap();
        let urgent1 = queue.enqueue(JobPriority::Urgent, receipt("u1")).await.unwrap();
        let low = queue.enqueue(JobPriority::Low, receipt("l")).await.unwrap();
        let urgent2 = queue.enqueue(JobPriority::Urgent, receipt("u2")).await.unwrap();
        let high = queue.enqueue(JobPriority::High, receipt("h")).await.unwrap();

        let listed = queue.list(Some(JobStatus::Queued)).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|j| j.meta.id.as_str()).collect();

        // Dequeue order: urgent, urgent (FIFO between them), high, normal, low.
        assert_eq!(
            ids,
            vec![
                urgent1.meta.id.as_str(),
                urgent2.meta.id.as_str(),
                high.meta.id.as_str(),
                normal.meta.id.as_str(),
                low.meta.id.as_str(),
            ]
        );

        let next = queue.next_queued().await.unwrap().unwrap();
        assert_eq!(next.meta.id, urgent1.meta.id);
    }

    #[tokio::test]
    async fn test_retry_only_from_failed() {
        let (queue, _) = memory_queue().await;

        let job = queue
            .enqueue(JobPriority::Normal, receipt("o-1"))
            .await
            .unwrap();

        let err = queue.retry(&job.meta.id).await.unwrap_err();
        assert!(matches!(err, JobError::NotRetryable { .. }));

        let err = queue.retry("missing").await.unwrap_err();
        assert!(matches!(err, JobError::NotFound(_)));

        // Force the job into failed, then retry legally.
        let failed = queue
            .update_job(&job, |j| {
                j.status = JobStatus::Failed;
                j.retry_count = j.max_retries;
                j.error_message = Some("printer offline".to_string());
            })
            .await
            .unwrap();

        let retried = queue.retry(&failed.meta.id).await.unwrap();
        assert_eq!(retried.status, JobStatus::Queued);
        assert_eq!(retried.retry_count, 0);
        assert!(retried.error_message.is_none());
    }

    #[tokio::test]
    async fn test_jobs_are_never_deleted() {
        let (queue, _) = memory_queue().await;

        let job = queue
            .enqueue(JobPriority::Normal, receipt("o-1"))
            .await
            .unwrap();
        queue
            .update_job(&job, |j| j.status = JobStatus::Completed)
            .await
            .unwrap();

        assert!(queue.list(Some(JobStatus::Queued)).await.unwrap().is_empty());
        assert_eq!(queue.list(None).await.unwrap().len(), 1);
    }
}
