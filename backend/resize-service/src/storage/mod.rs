//! Object store sink
//!
//! Encoded artifacts are written under `resize/` (single requests) or
//! `batch/` (batch items) and handed back to callers as presigned links.

mod memory;
mod s3;

pub use memory::{InMemoryObjectStore, StoredObject};
pub use s3::S3ObjectStore;

use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to upload {key}: {message}")]
    Upload { key: String, message: String },

    #[error("Failed to presign {key}: {message}")]
    Presign { key: String, message: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<()>;

    /// Time-limited download link for `key`.
    async fn presign(&self, key: &str, ttl: Duration) -> StorageResult<String>;
}

/// Object key layout
pub mod keys {
    use crate::jobs::JobId;
    use uuid::Uuid;

    fn unique_suffix() -> String {
        Uuid::now_v7().simple().to_string()
    }

    /// `resize/<id>.<ext>`
    pub fn single(extension: &str) -> String {
        format!("resize/{}.{}", unique_suffix(), extension)
    }

    /// `batch/<batch job id>_<id>.<ext>`
    pub fn batch(batch_job_id: &JobId, extension: &str) -> String {
        format!("batch/{}_{}.{}", batch_job_id, unique_suffix(), extension)
    }
}
