//! # Print Worker
//!
//! The single-worker processing loop: exactly one job is `processing`
//! at any moment, system-wide. The loop never dies on a job failure:
//! job failures feed the retry state machine; only unexpected store
//! failures earn a longer backoff before the loop resumes.
//!
//! ## Worker Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        One Worker Cycle                                 │
//! │                                                                         │
//! │  tick (poll_interval)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  next_queued()? ── none ──► sleep until next tick                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  commit: queued → processing                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  printer.print(job)                                                     │
//! │       │                                                                 │
//! │       ├── Ok ──► commit: processing → completed                         │
//! │       │                                                                 │
//! │       └── Err ─► retry_count += 1                                       │
//! │                    ├── < max_retries: wait 2^retry_count units,         │
//! │                    │                  commit: processing → queued       │
//! │                    └── == max_retries: commit: processing → failed      │
//! │                                                                         │
//! │  Shutdown is cooperative: honored at the next tick boundary; a          │
//! │  print attempt already in flight runs to completion first.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use atlas_core::JobStatus;

use crate::error::JobResult;
use crate::printer::Printer;
use crate::queue::PrintQueue;

// =============================================================================
// Configuration
// =============================================================================

/// Timing knobs for the worker loop.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep between idle/normal cycles.
    pub poll_interval: Duration,

    /// Longer sleep after an unexpected internal error (store down),
    /// so a sick store isn't hammered.
    pub error_backoff: Duration,

    /// One "time unit" of the retry curve; a failed attempt waits
    /// `retry_unit * 2^retry_count` before re-queueing.
    pub retry_unit: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            poll_interval: Duration::from_millis(500),
            error_backoff: Duration::from_secs(5),
            retry_unit: Duration::from_secs(1),
        }
    }
}

// =============================================================================
// Worker
// =============================================================================

/// The serial print worker.
pub struct PrintWorker {
    queue: PrintQueue,
    printer: Arc<dyn Printer>,
    config: WorkerConfig,
}

/// Handle controlling a spawned worker.
pub struct PrintWorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PrintWorkerHandle {
    /// Requests a cooperative stop and waits for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

impl PrintWorker {
    /// Creates a worker with default timing.
    pub fn new(queue: PrintQueue, printer: Arc<dyn Printer>) -> Self {
        PrintWorker {
            queue,
            printer,
            config: WorkerConfig::default(),
        }
    }

    /// Overrides the timing configuration.
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawns the worker loop as a background task.
    pub fn spawn(self) -> PrintWorkerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(self.run(shutdown_rx));
        PrintWorkerHandle { shutdown_tx, task }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "Print worker starting"
        );

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.process_next().await {
                        // Job failures never land here; this is the
                        // store misbehaving underneath the queue.
                        error!(error = %e, "Print worker cycle failed; backing off");
                        tokio::time::sleep(self.config.error_backoff).await;
                    }
                }

                _ = shutdown_rx.recv() => {
                    info!("Print worker stopping");
                    break;
                }
            }
        }
    }

    /// Pops and processes at most one job.
    pub(crate) async fn process_next(&self) -> JobResult<()> {
        let Some(job) = self.queue.next_queued().await? else {
            return Ok(());
        };

        let processing = self
            .queue
            .update_job(&job, |j| j.status = JobStatus::Processing)
            .await?;

        debug!(id = %processing.meta.id, kind = processing.kind(), "Printing job");

        match self.printer.print(&processing).await {
            Ok(()) => {
                self.queue
                    .update_job(&processing, |j| j.status = JobStatus::Completed)
                    .await?;
                info!(id = %processing.meta.id, "Print job completed");
            }
            Err(print_err) => {
                let attempts = processing.retry_count + 1;

                if attempts >= processing.max_retries {
                    warn!(
                        id = %processing.meta.id,
                        attempts,
                        error = %print_err,
                        "Print job failed terminally; retry budget exhausted"
                    );
                    self.queue
                        .update_job(&processing, |j| {
                            j.status = JobStatus::Failed;
                            j.retry_count = attempts;
                            j.error_message = Some(print_err.to_string());
                        })
                        .await?;
                } else {
                    // Exponential backoff: 2^retry_count time units,
                    // counted with the attempt we just spent.
                    let backoff = self
                        .config
                        .retry_unit
                        .saturating_mul(1u32 << attempts.min(16));

                    warn!(
                        id = %processing.meta.id,
                        attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %print_err,
                        "Print attempt failed; re-queueing after backoff"
                    );

                    tokio::time::sleep(backoff).await;
                    self.queue
                        .update_job(&processing, |j| {
                            j.status = JobStatus::Queued;
                            j.retry_count = attempts;
                            j.error_message = Some(print_err.to_string());
                        })
                        .await?;
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use crate::printer::PrintError;
    use crate::testutil::{memory_queue, receipt};
    use async_trait::async_trait;
    use atlas_core::{JobPriority, PrintJob};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Printer that fails the first `failures` attempts, then succeeds,
    /// recording the order-id of every successful print.
    struct FlakyPrinter {
        failures: AtomicU32,
        printed: Mutex<Vec<String>>,
    }

    impl FlakyPrinter {
        fn failing(failures: u32) -> Arc<Self> {
            Arc::new(FlakyPrinter {
                failures: AtomicU32::new(failures),
                printed: Mutex::new(Vec::new()),
            })
        }

        fn reliable() -> Arc<Self> {
            Self::failing(0)
        }

        fn printed(&self) -> Vec<String> {
            self.printed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Printer for FlakyPrinter {
        async fn print(&self, job: &PrintJob) -> Result<(), PrintError> {
            let remaining = self.failures.load(Ordering::Acquire);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::Release);
                return Err(PrintError::Offline);
            }
            let atlas_core::PrintPayload::Receipt { order_id, .. } = &job.payload else {
                return Err(PrintError::Failed("unexpected payload".to_string()));
            };
            self.printed.lock().unwrap().push(order_id.clone());
            Ok(())
        }
    }

    fn fast_config() -> WorkerConfig {
        WorkerConfig {
            poll_interval: Duration::from_millis(10),
            error_backoff: Duration::from_millis(100),
            retry_unit: Duration::from_millis(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_job_lifecycle() {
        let (queue, _) = memory_queue().await;
        let printer = FlakyPrinter::reliable();
        let worker =
            PrintWorker::new(queue.clone(), printer.clone()).with_config(fast_config());

        let job = queue
            .enqueue(JobPriority::Normal, receipt("o-1"))
            .await
            .unwrap();

        worker.process_next().await.unwrap();

        let done = queue.get(&job.meta.id).await.unwrap().unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(printer.printed(), vec!["o-1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_boundary_reaches_failed_at_max_retries() {
        let (queue, _) = memory_queue().await;
        let printer = FlakyPrinter::failing(u32::MAX);
        let worker =
            PrintWorker::new(queue.clone(), printer.clone()).with_config(fast_config());

        let job = queue
            .enqueue(JobPriority::Normal, receipt("o-1"))
            .await
            .unwrap();
        assert_eq!(job.max_retries, 3);

        // Failure 1 and 2: back to queued with the count ticking up.
        for expected in 1..=2u32 {
            worker.process_next().await.unwrap();
            let after = queue.get(&job.meta.id).await.unwrap().unwrap();
            assert_eq!(after.status, JobStatus::Queued, "failure {expected}");
            assert_eq!(after.retry_count, expected);
            assert!(after.error_message.is_some());
        }

        // Failure 3: retry budget is gone, terminal failed.
        worker.process_next().await.unwrap();
        let after = queue.get(&job.meta.id).await.unwrap().unwrap();
        assert_eq!(after.status, JobStatus::Failed);
        assert_eq!(after.retry_count, 3);

        // Terminal means terminal: the worker won't pick it up again.
        worker.process_next().await.unwrap();
        let still = queue.get(&job.meta.id).await.unwrap().unwrap();
        assert_eq!(still.status, JobStatus::Failed);

        // Manual retry resurrects it with a fresh budget...
        let retried = queue.retry(&job.meta.id).await.unwrap();
        assert_eq!(retried.status, JobStatus::Queued);
        assert_eq!(retried.retry_count, 0);

        // ...and with a now-healthy printer it completes.
        printer.failures.store(0, Ordering::Release);
        worker.process_next().await.unwrap();
        let done = queue.get(&job.meta.id).await.unwrap().unwrap();
        assert_eq!(done.status, JobStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_drains_in_priority_order() {
        let (queue, _) = memory_queue().await;
        let printer = FlakyPrinter::reliable();

        // Enqueue order: normal, urgent, low, urgent, high.
        for (priority, tag) in [
            (JobPriority::Normal, "n"),
            (JobPriority::Urgent, "u1"),
            (JobPriority::Low, "l"),
            (JobPriority::Urgent, "u2"),
            (JobPriority::High, "h"),
        ] {
            queue.enqueue(priority, receipt(tag)).await.unwrap();
        }

        let worker =
            PrintWorker::new(queue.clone(), printer.clone()).with_config(fast_config());
        let handle = worker.spawn();

        let mut drained = false;
        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if queue.list(Some(JobStatus::Completed)).await.unwrap().len() == 5 {
                drained = true;
                break;
            }
        }
        handle.shutdown().await;
        assert!(drained, "worker never completed all jobs");

        assert_eq!(
            printer.printed(),
            vec!["u1", "u2", "h", "n", "l"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_jobs_failure_does_not_starve_the_next() {
        let (queue, _) = memory_queue().await;

        // Fails every attempt of the first job (3), then works.
        let printer = FlakyPrinter::failing(3);

        let doomed = queue
            .enqueue(JobPriority::Urgent, receipt("doomed"))
            .await
            .unwrap();
        let fine = queue
            .enqueue(JobPriority::Normal, receipt("fine"))
            .await
            .unwrap();

        let worker =
            PrintWorker::new(queue.clone(), printer.clone()).with_config(fast_config());
        let handle = worker.spawn();

        let mut settled = false;
        for _ in 0..300 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let doomed_now = queue.get(&doomed.meta.id).await.unwrap().unwrap();
            let fine_now = queue.get(&fine.meta.id).await.unwrap().unwrap();
            if doomed_now.status == JobStatus::Failed && fine_now.status == JobStatus::Completed {
                settled = true;
                break;
            }
        }
        handle.shutdown().await;

        assert!(settled, "queue never settled after a terminal failure");
        assert_eq!(printer.printed(), vec!["fine".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_queue_cycle_is_a_noop() {
        let (queue, _) = memory_queue().await;
        let worker = PrintWorker::new(queue, FlakyPrinter::reliable()).with_config(fast_config());

        assert!(matches!(worker.process_next().await, Ok(())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_validation_blocks_bad_jobs() {
        let (queue, _) = memory_queue().await;

        let err = queue
            .enqueue(
                JobPriority::Normal,
                atlas_core::PrintPayload::Kitchen {
                    order_id: "o-1".to_string(),
                    items: Vec::new(),
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::InvalidPayload(_)));
    }
}
