//! Run counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters accumulated over one archive run
#[derive(Debug, Default)]
pub struct RunMetrics {
    days_processed: AtomicU64,
    jobs_fetched: AtomicU64,
    jobs_requeued: AtomicU64,
    jobs_dropped: AtomicU64,
    jobs_archived: AtomicU64,
    jobs_skipped: AtomicU64,
    images_archived: AtomicU64,
    archives_sealed: AtomicU64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day_processed(&self) {
        self.days_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Status record fetched successfully (either pass)
    pub fn job_fetched(&self) {
        self.jobs_fetched.fetch_add(1, Ordering::Relaxed);
    }

    /// Primary-pass fetch failed, id queued for the retry pass
    pub fn job_requeued(&self) {
        self.jobs_requeued.fetch_add(1, Ordering::Relaxed);
    }

    /// Retry-pass fetch failed, id dropped
    pub fn job_dropped(&self) {
        self.jobs_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Job admitted by the filter and packaged
    pub fn job_archived(&self) {
        self.jobs_archived.fetch_add(1, Ordering::Relaxed);
    }

    /// Job not packaged, either filtered out or carrying no images
    pub fn job_skipped(&self) {
        self.jobs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn image_archived(&self) {
        self.images_archived.fetch_add(1, Ordering::Relaxed);
    }

    pub fn archive_sealed(&self) {
        self.archives_sealed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            days_processed: self.days_processed.load(Ordering::Relaxed),
            jobs_fetched: self.jobs_fetched.load(Ordering::Relaxed),
            jobs_requeued: self.jobs_requeued.load(Ordering::Relaxed),
            jobs_dropped: self.jobs_dropped.load(Ordering::Relaxed),
            jobs_archived: self.jobs_archived.load(Ordering::Relaxed),
            jobs_skipped: self.jobs_skipped.load(Ordering::Relaxed),
            images_archived: self.images_archived.load(Ordering::Relaxed),
            archives_sealed: self.archives_sealed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub days_processed: u64,
    pub jobs_fetched: u64,
    pub jobs_requeued: u64,
    pub jobs_dropped: u64,
    pub jobs_archived: u64,
    pub jobs_skipped: u64,
    pub images_archived: u64,
    pub archives_sealed: u64,
}
