//! Delivery sink for sealed archives
//! Uses the Apache Arrow object_store crate

use object_store::{ObjectStore, path::Path as StoragePath};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::archive::SealedArchive;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StoreError>;

/// Metadata returned after delivery
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub key: String,
    pub etag: Option<String>,
    pub size: usize,
}

/// Archive sink wrapping any object_store backend
#[derive(Clone)]
pub struct ArchiveStore {
    store: Arc<dyn ObjectStore>,
}

impl ArchiveStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Local filesystem sink rooted at `dir`, creating it if missing
    pub fn local(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|source| StoreError::OutputDir {
            path: dir.display().to_string(),
            source,
        })?;

        let store = object_store::local::LocalFileSystem::new_with_prefix(dir)?;
        Ok(Self {
            store: Arc::new(store),
        })
    }

    /// In-memory sink for testing/development
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(object_store::memory::InMemory::new()),
        }
    }

    /// Write one sealed archive under its file name
    pub async fn deliver(&self, archive: &SealedArchive) -> Result<DeliveryReceipt> {
        let path = StoragePath::from(archive.file_name.as_str());
        let size = archive.data.len();

        let put_result = self.store.put(&path, archive.data.clone().into()).await?;

        tracing::info!(
            file_name = %archive.file_name,
            size,
            files = archive.file_count,
            jobs = archive.job_count,
            "Archive delivered"
        );

        Ok(DeliveryReceipt {
            key: archive.file_name.clone(),
            etag: put_result.e_tag.clone(),
            size,
        })
    }

    /// Read a delivered archive back
    pub async fn retrieve(&self, file_name: &str) -> Result<Vec<u8>> {
        let path = StoragePath::from(file_name);

        let result = self.store.get(&path).await?;
        let bytes = result.bytes().await?;

        Ok(bytes.to_vec())
    }

    /// Check if an archive was delivered
    pub async fn exists(&self, file_name: &str) -> Result<bool> {
        let path = StoragePath::from(file_name);

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
