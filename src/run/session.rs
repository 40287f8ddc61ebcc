//! Day-by-day retrieval session

use chrono::NaiveDate;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use super::{RunError, RunOptions, RunSummary};
use crate::archive::{ArchiveBatch, BatchScope};
use crate::observability::RunMetrics;
use crate::progress::{self, AttemptOutcome, FetchPass, ProgressEvent};
use crate::remote::{JobId, ServiceClient};
use crate::storage::ArchiveStore;

/// One archive run.
///
/// The session owns the service client, the delivery sink, the run counters
/// and the progress channel, and drives the whole range sequentially: one
/// day, one job, one image at a time.
pub struct ArchiveSession {
    client: ServiceClient,
    store: ArchiveStore,
    request_delay: Duration,
    filename_prefix: String,
    progress: UnboundedSender<ProgressEvent>,
    pub(super) metrics: RunMetrics,
    run_id: Uuid,
}

impl ArchiveSession {
    pub fn new(
        client: ServiceClient,
        store: ArchiveStore,
        request_delay: Duration,
        filename_prefix: impl Into<String>,
        progress: UnboundedSender<ProgressEvent>,
    ) -> Self {
        Self {
            client,
            store,
            request_delay,
            filename_prefix: filename_prefix.into(),
            progress,
            metrics: RunMetrics::new(),
            run_id: Uuid::new_v4(),
        }
    }

    /// Walk the configured date range and archive every admitted job.
    ///
    /// Per-job status failures are retried once and then dropped; a 403 on a
    /// day listing, any other listing failure, image fetch failures and
    /// delivery failures abort the run.
    pub async fn run(&self, options: &RunOptions) -> super::Result<RunSummary> {
        let started = Instant::now();
        let total_days = options.range.total_days();

        info!(
            run_id = %self.run_id,
            from = %options.range.start(),
            to = %options.range.end(),
            total_days,
            mode = ?options.mode,
            metadata_only = options.metadata_only,
            "Starting archive run"
        );

        for (day_offset, date) in options.range.days().enumerate() {
            self.process_day(date, day_offset + 1, total_days, options)
                .await?;
            self.metrics.day_processed();
        }

        let summary = RunSummary {
            metrics: self.metrics.snapshot(),
            elapsed: started.elapsed(),
        };

        self.emit(ProgressEvent::RunCompleted {
            days: total_days,
            archives: summary.metrics.archives_sealed,
        });

        info!(
            run_id = %self.run_id,
            jobs_fetched = summary.metrics.jobs_fetched,
            jobs_dropped = summary.metrics.jobs_dropped,
            archives = summary.metrics.archives_sealed,
            "Archive run complete"
        );

        Ok(summary)
    }

    async fn process_day(
        &self,
        date: NaiveDate,
        day_index: usize,
        total_days: usize,
        options: &RunOptions,
    ) -> super::Result<()> {
        let listing = match self.client.day_listing(date).await {
            Ok(listing) => listing,
            Err(e) if e.status_code() == Some(403) => {
                return Err(RunError::Auth {
                    base_url: self.client.base_url().to_string(),
                });
            }
            Err(source) => return Err(RunError::Listing { date, source }),
        };

        let total_jobs = listing.len();
        info!(%date, day_index, total_jobs, "Day listing fetched");

        self.emit(ProgressEvent::DayStarted {
            date,
            day_index,
            total_days,
            total_jobs,
        });

        let day_started = Instant::now();
        let scope = BatchScope { date, ordinal: 1 };
        let mut batch = ArchiveBatch::open(&self.filename_prefix, scope, options.capacity);
        let mut retry_queue: Vec<JobId> = Vec::new();

        // Primary pass over the listing. Only successful fetches count as
        // completed for the time estimate.
        let mut fetched = 0usize;
        for (position, job_id) in listing.iter().enumerate() {
            let outcome = self
                .attempt_job(&mut batch, job_id, FetchPass::Primary, options)
                .await?;
            match outcome {
                AttemptOutcome::Fetched => fetched += 1,
                AttemptOutcome::Failed => retry_queue.push(job_id.clone()),
            }

            self.emit(ProgressEvent::JobAttempted {
                job_id: job_id.clone(),
                pass: FetchPass::Primary,
                outcome,
                job_index: position + 1,
                total_jobs,
                day_index,
                total_days,
                remaining: progress::estimate_remaining(
                    total_jobs,
                    fetched,
                    day_started,
                    Instant::now(),
                ),
            });
        }

        // Retry pass: one more attempt each, further failures are dropped
        let retry_total = retry_queue.len();
        if retry_total > 0 {
            info!(%date, retry_total, "Retrying failed status fetches");
        }

        let mut retried = 0usize;
        for (position, job_id) in retry_queue.iter().enumerate() {
            let outcome = self
                .attempt_job(&mut batch, job_id, FetchPass::Retry, options)
                .await?;
            if outcome == AttemptOutcome::Fetched {
                retried += 1;
            }

            self.emit(ProgressEvent::JobAttempted {
                job_id: job_id.clone(),
                pass: FetchPass::Retry,
                outcome,
                job_index: position + 1,
                total_jobs: retry_total,
                day_index,
                total_days,
                // The day total still feeds the estimate here, with the
                // completed count restarted for the pass
                remaining: progress::estimate_remaining(
                    total_jobs,
                    retried,
                    day_started,
                    Instant::now(),
                ),
            });
        }

        // Leftover files ship in a final short archive
        if !batch.is_empty() {
            self.seal_and_deliver(batch).await?;
        }

        self.emit(ProgressEvent::DayCompleted {
            date,
            day_index,
            total_days,
        });

        Ok(())
    }

    /// Fetch one job's status and, on success, package it.
    async fn attempt_job(
        &self,
        batch: &mut ArchiveBatch,
        job_id: &JobId,
        pass: FetchPass,
        options: &RunOptions,
    ) -> super::Result<AttemptOutcome> {
        sleep(self.request_delay).await;

        match self.client.job_status(job_id).await {
            Ok(mut job) => {
                self.metrics.job_fetched();
                self.package_job(batch, &mut job, options).await?;
                Ok(AttemptOutcome::Fetched)
            }
            Err(error) => {
                match pass {
                    FetchPass::Primary => {
                        warn!(job_id = %job_id, error = %error, "Status fetch failed, queued for retry");
                        self.metrics.job_requeued();
                    }
                    FetchPass::Retry => {
                        warn!(job_id = %job_id, error = %error, "Status fetch failed twice, dropped");
                        self.metrics.job_dropped();
                    }
                }
                Ok(AttemptOutcome::Failed)
            }
        }
    }

    /// Seal `batch` and hand it to the sink.
    pub(super) async fn seal_and_deliver(&self, batch: ArchiveBatch) -> super::Result<()> {
        let sealed = batch.seal()?;
        self.store.deliver(&sealed).await?;
        self.metrics.archive_sealed();

        self.emit(ProgressEvent::ArchiveSealed {
            file_name: sealed.file_name,
            file_count: sealed.file_count,
            job_count: sealed.job_count,
        });

        Ok(())
    }

    pub(super) fn client(&self) -> &ServiceClient {
        &self.client
    }

    /// Progress is best-effort; a dropped receiver never stops the run.
    pub(super) fn emit(&self, event: ProgressEvent) {
        let _ = self.progress.send(event);
    }
}
