//! Per-job image packaging

use tracing::debug;

use super::session::ArchiveSession;
use super::{RunError, RunOptions};
use crate::archive::{ArchiveBatch, filename};
use crate::classify;
use crate::remote::JobStatus;

impl ArchiveSession {
    /// Classify one fetched job and, when admitted, pull its images into the
    /// batch.
    ///
    /// The manifest record is refreshed after every file, so a mid-job batch
    /// rotation leaves the job in both archives, each carrying the file list
    /// it held at seal time. Jobs without image paths leave no trace.
    pub(super) async fn package_job(
        &self,
        batch: &mut ArchiveBatch,
        job: &mut JobStatus,
        options: &RunOptions,
    ) -> super::Result<()> {
        if !classify::should_include(job, options.mode) {
            self.metrics.job_skipped();
            debug!(job_id = %job.id, kind = ?job.kind, "Job excluded by filter");
            return Ok(());
        }

        let image_paths = job.image_paths.clone().unwrap_or_default();
        if image_paths.is_empty() {
            self.metrics.job_skipped();
            debug!(job_id = %job.id, "Job has no images");
            return Ok(());
        }

        job.archived_files.clear();
        let timestamp = filename::format_enqueue_time(job.enqueue_time.as_deref());
        let job_key = job.id.to_string();
        let multi = image_paths.len() > 1;

        for (index, image_url) in image_paths.iter().enumerate() {
            if options.metadata_only {
                batch.count_file();
            } else {
                let bytes = self
                    .client()
                    .fetch_image(image_url)
                    .await
                    .map_err(|source| RunError::Image {
                        job_id: job_key.clone(),
                        source,
                    })?;

                let position = multi.then_some(index);
                let name =
                    filename::image_filename(&timestamp, &job_key, position, job.prompt.as_deref());

                job.archived_files.push(name.clone());
                batch.add_file(&name, &bytes)?;
                self.metrics.image_archived();
            }

            batch.record_job(job);

            if batch.is_full() {
                let successor = batch.successor();
                let full = std::mem::replace(batch, successor);
                self.seal_and_deliver(full).await?;
            }
        }

        self.metrics.job_archived();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::BatchScope;
    use crate::classify::FilterMode;
    use crate::config::ApiConfig;
    use crate::progress::ProgressEvent;
    use crate::remote::ServiceClient;
    use crate::run::{DateRange, RunOptions};
    use crate::storage::ArchiveStore;
    use chrono::NaiveDate;
    use std::num::NonZeroUsize;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
    }

    fn session() -> (ArchiveSession, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let client = ServiceClient::new(&ApiConfig::default()).unwrap();
        let session = ArchiveSession::new(
            client,
            ArchiveStore::in_memory(),
            Duration::ZERO,
            "vault",
            tx,
        );
        (session, rx)
    }

    fn options(capacity: Option<usize>) -> RunOptions {
        RunOptions {
            range: DateRange::new(date(), date()).unwrap(),
            mode: FilterMode::OnlyV5Upscales,
            capacity: capacity.and_then(NonZeroUsize::new),
            metadata_only: true,
        }
    }

    fn upscale_job(id: &str, images: usize) -> JobStatus {
        let paths: Vec<String> = (0..images)
            .map(|i| format!("https://cdn.example.com/{}/{}.png", id, i))
            .collect();
        serde_json::from_value(serde_json::json!({
            "id": id,
            "enqueue_time": "2023-06-01 10:00:00",
            "prompt": "p",
            "type": "upscale",
            "_parsed_params": { "version": "5" },
            "image_paths": paths,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_metadata_only_counts_without_entries() {
        let (session, _rx) = session();
        let scope = BatchScope {
            date: date(),
            ordinal: 1,
        };
        let mut batch = ArchiveBatch::open("vault", scope, None);
        let mut job = upscale_job("j1", 4);

        session
            .package_job(&mut batch, &mut job, &options(None))
            .await
            .unwrap();

        assert_eq!(batch.file_count(), 4);
        assert_eq!(batch.job_count(), 1);
        assert!(job.archived_files.is_empty());
    }

    #[tokio::test]
    async fn test_mid_job_rotation() {
        let (session, mut rx) = session();
        let scope = BatchScope {
            date: date(),
            ordinal: 1,
        };
        let mut batch = ArchiveBatch::open("vault", scope, NonZeroUsize::new(3));
        let mut job = upscale_job("j1", 4);

        session
            .package_job(&mut batch, &mut job, &options(Some(3)))
            .await
            .unwrap();

        // Three files sealed, the fourth carried into the successor
        assert_eq!(batch.scope().ordinal, 2);
        assert_eq!(batch.file_count(), 1);
        assert_eq!(batch.job_count(), 1);

        match rx.try_recv().unwrap() {
            ProgressEvent::ArchiveSealed {
                file_name,
                file_count,
                job_count,
            } => {
                assert_eq!(file_name, "vault_2023-6-1_[1-3].zip");
                assert_eq!(file_count, 3);
                assert_eq!(job_count, 1);
            }
            other => panic!("expected ArchiveSealed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_filtered_job_leaves_no_trace() {
        let (session, _rx) = session();
        let scope = BatchScope {
            date: date(),
            ordinal: 1,
        };
        let mut batch = ArchiveBatch::open("vault", scope, None);

        let mut job: JobStatus = serde_json::from_value(serde_json::json!({
            "id": "grid-job",
            "type": "grid",
            "_parsed_params": { "version": "4" },
            "image_paths": ["https://cdn.example.com/g.png"],
        }))
        .unwrap();

        session
            .package_job(&mut batch, &mut job, &options(None))
            .await
            .unwrap();

        assert_eq!(batch.file_count(), 0);
        assert_eq!(batch.job_count(), 0);
    }

    #[tokio::test]
    async fn test_job_without_images_not_recorded() {
        let (session, _rx) = session();
        let scope = BatchScope {
            date: date(),
            ordinal: 1,
        };
        let mut batch = ArchiveBatch::open("vault", scope, None);

        let mut job: JobStatus = serde_json::from_value(serde_json::json!({
            "id": "empty-job",
            "type": "upscale",
            "_parsed_params": { "version": "5" },
            "image_paths": null,
        }))
        .unwrap();

        session
            .package_job(&mut batch, &mut job, &options(None))
            .await
            .unwrap();

        assert_eq!(batch.file_count(), 0);
        assert_eq!(batch.job_count(), 0);
    }
}
