use super::{ObjectStore, StorageError, StorageResult};
use bytes::Bytes;
use s3_utils::{S3Client, S3Error};
use std::time::Duration;

/// [`ObjectStore`] backed by S3 or an S3-compatible endpoint.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    pub fn bucket(&self) -> &str {
        &self.client.config().bucket
    }
}

impl From<S3Error> for StorageError {
    fn from(e: S3Error) -> Self {
        match e {
            S3Error::Upload { key, message } => StorageError::Upload { key, message },
            S3Error::Presign { key, message } => StorageError::Presign { key, message },
            other @ S3Error::Health { .. } => StorageError::Upload {
                key: String::new(),
                message: other.to_string(),
            },
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<()> {
        self.client.put_object(key, body, content_type).await?;
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        Ok(self.client.presigned_download_url(key, ttl).await?)
    }
}
