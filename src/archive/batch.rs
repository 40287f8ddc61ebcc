//! Size-bounded zip accumulation

use bytes::Bytes;
use chrono::{Datelike, NaiveDate};
use std::io::{Cursor, Write};
use std::num::NonZeroUsize;
use thiserror::Error;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::remote::JobStatus;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Zip write failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Manifest entry carried by every sealed archive.
pub const MANIFEST_NAME: &str = "archived_jobs.json";

/// Day and position an archive batch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchScope {
    pub date: NaiveDate,
    /// 1-based position within the day.
    pub ordinal: u32,
}

/// A finished archive ready for delivery.
#[derive(Debug, Clone)]
pub struct SealedArchive {
    pub file_name: String,
    pub data: Bytes,
    pub file_count: usize,
    pub job_count: usize,
}

/// One in-progress zip archive.
///
/// Files accumulate until the optional capacity is reached; the owner then
/// seals the batch and opens its successor. Sealing consumes the batch, so a
/// sealed archive can never grow.
pub struct ArchiveBatch {
    prefix: String,
    scope: BatchScope,
    capacity: Option<NonZeroUsize>,
    writer: ZipWriter<Cursor<Vec<u8>>>,
    file_count: usize,
    manifest: Vec<JobStatus>,
}

impl ArchiveBatch {
    pub fn open(prefix: &str, scope: BatchScope, capacity: Option<NonZeroUsize>) -> Self {
        Self {
            prefix: prefix.to_string(),
            scope,
            capacity,
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            file_count: 0,
            manifest: Vec::new(),
        }
    }

    /// Fresh empty batch for the same day, next ordinal.
    pub fn successor(&self) -> Self {
        let scope = BatchScope {
            date: self.scope.date,
            ordinal: self.scope.ordinal + 1,
        };
        Self::open(&self.prefix, scope, self.capacity)
    }

    pub fn scope(&self) -> BatchScope {
        self.scope
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn job_count(&self) -> usize {
        self.manifest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }

    /// Whether the capacity is reached. Always false for unbounded batches.
    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|capacity| self.file_count >= capacity.get())
    }

    /// Write one image entry and count it.
    pub fn add_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        // PNG payloads are already compressed, store them as-is
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        self.writer.start_file(name, options)?;
        self.writer.write_all(data)?;
        self.file_count += 1;
        Ok(())
    }

    /// Count an entry without storing bytes (metadata-only runs).
    pub fn count_file(&mut self) {
        self.file_count += 1;
    }

    /// Insert or refresh the manifest entry for `job`, keyed by id.
    ///
    /// Refreshing matters for jobs whose images land in more than one batch:
    /// the record is re-recorded per image, so a batch sealed later carries
    /// the fuller `_archived_files` list.
    pub fn record_job(&mut self, job: &JobStatus) {
        match self.manifest.iter_mut().find(|entry| entry.id == job.id) {
            Some(entry) => *entry = job.clone(),
            None => self.manifest.push(job.clone()),
        }
    }

    /// File name this batch seals under.
    ///
    /// Unbounded batches carry their file count; bounded batches carry the
    /// cumulative file range their ordinal spans within the day. Month and
    /// day are deliberately unpadded, matching the day-listing query form.
    pub fn file_name(&self) -> String {
        let date = self.scope.date;
        let day = format!("{}-{}-{}", date.year(), date.month(), date.day());

        match self.capacity {
            None => format!("{}_{}_[{}].zip", self.prefix, day, self.file_count),
            Some(capacity) => {
                let start = (self.scope.ordinal as usize - 1) * capacity.get() + 1;
                let end = (start + self.file_count).saturating_sub(1);
                format!("{}_{}_[{}-{}].zip", self.prefix, day, start, end)
            }
        }
    }

    /// Seal the batch: append the manifest and finish the container.
    pub fn seal(mut self) -> Result<SealedArchive> {
        let file_name = self.file_name();
        let manifest_json = serde_json::to_vec(&self.manifest)?;

        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        self.writer.start_file(MANIFEST_NAME, options)?;
        self.writer.write_all(&manifest_json)?;

        let cursor = self.writer.finish()?;

        Ok(SealedArchive {
            file_name,
            data: Bytes::from(cursor.into_inner()),
            file_count: self.file_count,
            job_count: self.manifest.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn scope(ordinal: u32) -> BatchScope {
        BatchScope {
            date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            ordinal,
        }
    }

    fn job(id: &str, files: &[&str]) -> JobStatus {
        let mut job: JobStatus =
            serde_json::from_value(serde_json::json!({ "id": id, "prompt": "p" })).unwrap();
        job.archived_files = files.iter().map(|f| f.to_string()).collect();
        job
    }

    #[test]
    fn test_capacity_gates_fullness() {
        let capacity = NonZeroUsize::new(2);
        let mut batch = ArchiveBatch::open("vault", scope(1), capacity);
        assert!(!batch.is_full());

        batch.add_file("a.png", b"png-a").unwrap();
        assert!(!batch.is_full());

        batch.add_file("b.png", b"png-b").unwrap();
        assert!(batch.is_full());
        assert_eq!(batch.file_count(), 2);
    }

    #[test]
    fn test_unbounded_never_full() {
        let mut batch = ArchiveBatch::open("vault", scope(1), None);
        for i in 0..100 {
            batch.add_file(&format!("{}.png", i), b"png").unwrap();
        }
        assert!(!batch.is_full());
    }

    #[test]
    fn test_count_file_reaches_capacity() {
        let mut batch = ArchiveBatch::open("vault", scope(1), NonZeroUsize::new(3));
        batch.count_file();
        batch.count_file();
        batch.count_file();
        assert!(batch.is_full());
        assert_eq!(batch.file_count(), 3);
    }

    #[test]
    fn test_successor_restarts_empty() {
        let mut batch = ArchiveBatch::open("vault", scope(1), NonZeroUsize::new(1));
        batch.add_file("a.png", b"png").unwrap();
        batch.record_job(&job("j1", &["a.png"]));

        let next = batch.successor();
        assert_eq!(next.scope().ordinal, 2);
        assert_eq!(next.file_count(), 0);
        assert_eq!(next.job_count(), 0);
        assert!(next.is_empty());
    }

    #[test]
    fn test_record_job_dedups_and_refreshes() {
        let mut batch = ArchiveBatch::open("vault", scope(1), None);
        batch.record_job(&job("j1", &["a.png"]));
        batch.record_job(&job("j2", &["b.png"]));
        batch.record_job(&job("j1", &["a.png", "c.png"]));

        assert_eq!(batch.job_count(), 2);
        assert_eq!(batch.manifest[0].archived_files, vec!["a.png", "c.png"]);
        assert_eq!(batch.manifest[1].archived_files, vec!["b.png"]);
    }

    #[test]
    fn test_file_name_unbounded() {
        let mut batch = ArchiveBatch::open("vault", scope(1), None);
        batch.count_file();
        batch.count_file();
        batch.count_file();
        assert_eq!(batch.file_name(), "vault_2023-6-1_[3].zip");
    }

    #[test]
    fn test_file_name_bounded_ranges() {
        let capacity = NonZeroUsize::new(10);

        let mut first = ArchiveBatch::open("vault", scope(1), capacity);
        for _ in 0..10 {
            first.count_file();
        }
        assert_eq!(first.file_name(), "vault_2023-6-1_[1-10].zip");

        let mut third = ArchiveBatch::open("vault", scope(3), capacity);
        for _ in 0..4 {
            third.count_file();
        }
        assert_eq!(third.file_name(), "vault_2023-6-1_[21-24].zip");
    }

    #[test]
    fn test_seal_round_trip() {
        let mut batch = ArchiveBatch::open("vault", scope(1), None);
        batch.add_file("a.png", b"png-bytes-a").unwrap();
        batch.record_job(&job("j1", &["a.png"]));
        batch.add_file("b.png", b"png-bytes-b").unwrap();
        batch.record_job(&job("j2", &["b.png"]));

        let sealed = batch.seal().unwrap();
        assert_eq!(sealed.file_name, "vault_2023-6-1_[2].zip");
        assert_eq!(sealed.file_count, 2);
        assert_eq!(sealed.job_count, 2);

        let mut archive = zip::ZipArchive::new(Cursor::new(sealed.data.to_vec())).unwrap();
        assert_eq!(archive.len(), 3);

        let mut image = Vec::new();
        archive
            .by_name("a.png")
            .unwrap()
            .read_to_end(&mut image)
            .unwrap();
        assert_eq!(image, b"png-bytes-a");

        let mut manifest_json = String::new();
        archive
            .by_name(MANIFEST_NAME)
            .unwrap()
            .read_to_string(&mut manifest_json)
            .unwrap();

        let manifest: Vec<JobStatus> = serde_json::from_str(&manifest_json).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[0].archived_files, vec!["a.png"]);
    }
}
