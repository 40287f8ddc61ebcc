//! Progress reporting for archive runs
//!
//! The session pushes [`ProgressEvent`]s onto an unbounded channel; the
//! consumer (the CLI prints them, tests collect them) renders each with
//! [`ProgressEvent::message`]. Events are emitted after every per-job fetch
//! attempt, around archive seals and at day and run boundaries.

use chrono::NaiveDate;
use std::time::{Duration, Instant};

use crate::humanize::HumanDuration;
use crate::remote::JobId;

/// Weight given to the recent-throughput term of the estimate.
pub const RECENT_WEIGHT: f64 = 0.7;

/// Which traversal of the day's job listing an attempt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPass {
    Primary,
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Fetched,
    Failed,
}

/// One observable step of a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    DayStarted {
        date: NaiveDate,
        day_index: usize,
        total_days: usize,
        total_jobs: usize,
    },
    JobAttempted {
        job_id: JobId,
        pass: FetchPass,
        outcome: AttemptOutcome,
        job_index: usize,
        total_jobs: usize,
        day_index: usize,
        total_days: usize,
        remaining: Option<Duration>,
    },
    ArchiveSealed {
        file_name: String,
        file_count: usize,
        job_count: usize,
    },
    DayCompleted {
        date: NaiveDate,
        day_index: usize,
        total_days: usize,
    },
    RunCompleted {
        days: usize,
        archives: u64,
    },
}

impl ProgressEvent {
    /// Human-readable one-liner for this event.
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::DayStarted {
                date,
                day_index,
                total_days,
                total_jobs,
            } => format!(
                "Day {}/{}: {}, {} jobs",
                day_index, total_days, date, total_jobs
            ),
            ProgressEvent::JobAttempted {
                job_id,
                pass: FetchPass::Primary,
                outcome: AttemptOutcome::Fetched,
                job_index,
                total_jobs,
                remaining,
                ..
            } => format!(
                "[{}/{}] fetched {}{}",
                job_index,
                total_jobs,
                job_id,
                remaining_suffix(*remaining)
            ),
            ProgressEvent::JobAttempted {
                job_id,
                pass: FetchPass::Primary,
                outcome: AttemptOutcome::Failed,
                job_index,
                total_jobs,
                ..
            } => format!(
                "[{}/{}] {} failed, queued for retry",
                job_index, total_jobs, job_id
            ),
            ProgressEvent::JobAttempted {
                job_id,
                pass: FetchPass::Retry,
                outcome: AttemptOutcome::Fetched,
                job_index,
                total_jobs,
                remaining,
                ..
            } => format!(
                "retry [{}/{}]: fetched {}{}",
                job_index,
                total_jobs,
                job_id,
                remaining_suffix(*remaining)
            ),
            ProgressEvent::JobAttempted {
                job_id,
                pass: FetchPass::Retry,
                outcome: AttemptOutcome::Failed,
                job_index,
                total_jobs,
                ..
            } => format!(
                "retry [{}/{}]: {} failed twice, dropped",
                job_index, total_jobs, job_id
            ),
            ProgressEvent::ArchiveSealed {
                file_name,
                file_count,
                job_count,
            } => format!(
                "sealed {}: {} files, {} jobs",
                file_name, file_count, job_count
            ),
            ProgressEvent::DayCompleted {
                date,
                day_index,
                total_days,
            } => format!("Day {}/{} done: {}", day_index, total_days, date),
            ProgressEvent::RunCompleted { days, archives } => format!(
                "Archive run complete: {} days, {} archives",
                days, archives
            ),
        }
    }
}

fn remaining_suffix(remaining: Option<Duration>) -> String {
    match remaining {
        Some(d) => format!(", about {} left", HumanDuration(d)),
        None => String::new(),
    }
}

/// Estimate the time left for a day from its throughput so far.
///
/// Returns `None` until at least one item has completed. The smoothed
/// average currently collapses to the plain average since both terms share
/// one sample.
/// TODO: feed a sliding recent-window average into the second term so the
/// weight has an effect.
pub fn estimate_remaining(
    total_items: usize,
    completed_items: usize,
    started_at: Instant,
    now: Instant,
) -> Option<Duration> {
    if completed_items == 0 {
        return None;
    }

    let elapsed = now.saturating_duration_since(started_at);
    let average = elapsed.as_secs_f64() / completed_items as f64;
    let weighted = average * RECENT_WEIGHT + average * (1.0 - RECENT_WEIGHT);
    let remaining = weighted * total_items.saturating_sub(completed_items) as f64;

    Some(Duration::from_secs_f64(remaining))
}
