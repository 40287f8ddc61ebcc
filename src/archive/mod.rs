//! Size-bounded zip archives of job images

mod batch;
pub mod filename;

pub use batch::{ArchiveBatch, ArchiveError, BatchScope, MANIFEST_NAME, Result, SealedArchive};
