//! Publish jobs and the bounded pool that runs them.
//!
//! A `POST /producer` request turns into one job: `count` sequential
//! publishes of the demo payload. Jobs run in the background so the HTTP
//! response never waits on the broker.
//!
//! # Structured Concurrency
//!
//! Jobs are spawned on a `tokio_util::task::TaskTracker` and bounded by a
//! `Semaphore`, so at most `workers` jobs publish at once while the rest
//! wait for a permit. Every job observes the pool's `CancellationToken`
//! before each send and while a send is in flight. Call
//! [`PublishPool::shutdown`] to drain or cancel outstanding jobs.
//!
//! # Completion
//!
//! [`PublishPool::submit`] hands back a [`PublishTicket`]. Awaiting it yields
//! the job's [`PublishReport`]; dropping it leaves the job running.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{Semaphore, oneshot};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::broker::MessagePublisher;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{DEMO_PAYLOAD, PublishReport};

/// Publish `count` copies of `payload`, one after another.
///
/// A failed send is logged and counted and the loop moves on to the next
/// message; nothing is retried. The loop stops early only when `cancel`
/// fires, in which case the report is marked `cancelled`.
pub async fn publish_messages(
    publisher: &dyn MessagePublisher,
    job_id: Uuid,
    payload: &[u8],
    count: u64,
    cancel: &CancellationToken,
) -> PublishReport {
    let mut report = PublishReport::new(job_id, count);
    let destination = publisher.destination();

    for index in 0..count {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let started = Instant::now();
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                report.cancelled = true;
                break;
            }
            result = publisher.publish(payload) => {
                metrics::record_publish_duration(destination, started.elapsed().as_secs_f64());
                match result {
                    Ok(()) => {
                        report.record_success();
                        metrics::record_message_published(destination, "success");
                    }
                    Err(e) => {
                        warn!(index, error = %e, "Failed to write message");
                        report.record_failure(&e);
                        metrics::record_message_published(destination, "failure");
                    }
                }
            }
        }
    }

    report.finish();
    report
}

/// Lifetime counters across every job the pool has finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolTotals {
    pub jobs_completed: u64,
    pub messages_sent: u64,
    pub messages_failed: u64,
}

/// Counters use `Ordering::Relaxed`; they are only read for reporting.
#[derive(Default)]
struct Counters {
    jobs_completed: AtomicU64,
    messages_sent: AtomicU64,
    messages_failed: AtomicU64,
}

/// Handle to a submitted job.
#[derive(Debug)]
pub struct PublishTicket {
    pub job_id: Uuid,
    pub requested: u64,
    report: oneshot::Receiver<PublishReport>,
}

impl PublishTicket {
    /// Wait for the job to finish.
    ///
    /// Returns `None` only if the job task was aborted before reporting.
    pub async fn wait(self) -> Option<PublishReport> {
        self.report.await.ok()
    }
}

/// Bounded pool of publish jobs sharing one publisher.
///
/// Clonable; clones share the same publisher, permits and tracker.
#[derive(Clone)]
pub struct PublishPool {
    publisher: Arc<dyn MessagePublisher>,
    payload: Arc<[u8]>,
    permits: Arc<Semaphore>,
    counters: Arc<Counters>,
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
}

impl PublishPool {
    /// Create a pool that runs at most `workers` jobs at once.
    ///
    /// A `workers` value of zero is treated as one.
    pub fn new(publisher: Arc<dyn MessagePublisher>, workers: usize) -> Self {
        Self {
            publisher,
            payload: Arc::from(DEMO_PAYLOAD),
            permits: Arc::new(Semaphore::new(workers.max(1))),
            counters: Arc::new(Counters::default()),
            task_tracker: TaskTracker::new(),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Submit a job publishing `count` messages.
    ///
    /// Returns immediately; the job waits for a free worker in the
    /// background.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ShuttingDown` once [`shutdown`](Self::shutdown)
    /// has started.
    pub fn submit(&self, count: u64) -> AppResult<PublishTicket> {
        if self.task_tracker.is_closed() {
            return Err(AppError::ShuttingDown);
        }

        let job_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        let publisher = self.publisher.clone();
        let payload = self.payload.clone();
        let permits = self.permits.clone();
        let counters = self.counters.clone();
        let cancel = self.cancellation_token.clone();

        self.task_tracker.spawn(
            async move {
                let report =
                    run_job(publisher.as_ref(), &payload, &permits, &cancel, job_id, count).await;

                counters.jobs_completed.fetch_add(1, Ordering::Relaxed);
                counters
                    .messages_sent
                    .fetch_add(report.sent, Ordering::Relaxed);
                counters
                    .messages_failed
                    .fetch_add(report.failed, Ordering::Relaxed);

                // The ticket may already be gone; the report is still logged.
                let _ = tx.send(report);
            }
            .instrument(info_span!("publish_job", %job_id, count)),
        );

        debug!(%job_id, count, "Publish job submitted");
        Ok(PublishTicket {
            job_id,
            requested: count,
            report: rx,
        })
    }

    /// Lifetime totals of finished jobs.
    pub fn totals(&self) -> PoolTotals {
        PoolTotals {
            jobs_completed: self.counters.jobs_completed.load(Ordering::Relaxed),
            messages_sent: self.counters.messages_sent.load(Ordering::Relaxed),
            messages_failed: self.counters.messages_failed.load(Ordering::Relaxed),
        }
    }

    /// Number of jobs submitted but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.task_tracker.len()
    }

    /// Stop accepting jobs and wait for outstanding ones.
    ///
    /// This method:
    /// 1. Closes the pool so `submit` starts failing
    /// 2. Waits up to `grace` for running and queued jobs to finish
    /// 3. Cancels whatever is left and waits for it to stop
    ///
    /// Returns `true` if every job finished within `grace`.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        info!(in_flight = self.in_flight(), "Draining publish jobs");

        self.task_tracker.close();

        let drained = tokio::time::timeout(grace, self.task_tracker.wait())
            .await
            .is_ok();

        if !drained {
            warn!(
                grace_ms = grace.as_millis() as u64,
                remaining = self.in_flight(),
                "Grace period elapsed, cancelling remaining publish jobs"
            );
            self.cancellation_token.cancel();
            self.task_tracker.wait().await;
        }

        info!(drained, "All publish jobs have completed");
        drained
    }
}

/// Wait for a worker slot, then publish.
async fn run_job(
    publisher: &dyn MessagePublisher,
    payload: &[u8],
    permits: &Semaphore,
    cancel: &CancellationToken,
    job_id: Uuid,
    count: u64,
) -> PublishReport {
    let permit = tokio::select! {
        biased;

        _ = cancel.cancelled() => None,
        permit = permits.acquire() => permit.ok(),
    };

    let report = match permit {
        Some(_permit) => {
            info!(destination = publisher.destination(), "Start writing messages to Kafka");
            metrics::adjust_jobs_in_flight(1.0);
            let report = publish_messages(publisher, job_id, payload, count, cancel).await;
            metrics::adjust_jobs_in_flight(-1.0);
            report
        }
        None => {
            let mut report = PublishReport::new(job_id, count);
            report.cancelled = true;
            report.finish();
            report
        }
    };

    let outcome = if report.cancelled {
        "cancelled"
    } else if report.failed > 0 {
        "partial"
    } else {
        "complete"
    };
    metrics::record_publish_job(outcome);

    info!(
        requested = report.requested,
        sent = report.sent,
        failed = report.failed,
        outcome,
        "Publish job finished"
    );
    report
}
