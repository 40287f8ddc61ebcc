//! The archive run: day iteration, retry pass, packaging
//!
//! An [`ArchiveSession`] owns everything one run needs (service client,
//! delivery sink, progress channel, counters) and walks the requested date
//! range a day at a time. Per-job fetch failures go through a single retry
//! pass; everything else that fails aborts the run.

mod packager;
mod session;

pub use session::ArchiveSession;

use chrono::NaiveDate;
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::classify::FilterMode;
use crate::observability::MetricsSnapshot;
use crate::remote::FetchError;
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Received HTTP 403 Forbidden. It seems you're not logged into {base_url}.")]
    Auth { base_url: String },

    #[error("Day listing for {date} failed: {source}")]
    Listing {
        date: NaiveDate,
        #[source]
        source: FetchError,
    },

    #[error("Image fetch failed for job {job_id}: {source}")]
    Image {
        job_id: String,
        #[source]
        source: FetchError,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Delivery failed: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RunError>;

#[derive(Debug, Error)]
#[error("Invalid date range: {start} is after {end}")]
pub struct InvalidDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive calendar range, iterated oldest day first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> std::result::Result<Self, InvalidDateRange> {
        if start > end {
            return Err(InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn total_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.total_days())
    }
}

/// What one run should archive.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub range: DateRange,
    pub mode: FilterMode,
    /// Files per archive; `None` keeps a whole day in one archive.
    pub capacity: Option<NonZeroUsize>,
    /// Record jobs and count their files without downloading images.
    pub metadata_only: bool,
}

/// Terminal accounting for a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub metrics: MetricsSnapshot,
    pub elapsed: Duration,
}
