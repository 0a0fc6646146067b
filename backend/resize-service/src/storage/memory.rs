//! In-process object store for tests.

use super::{ObjectStore, StorageError, StorageResult};
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<DashMap<String, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|o| o.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<()> {
        self.objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        if !self.objects.contains_key(key) {
            return Err(StorageError::Presign {
                key: key.to_string(),
                message: "no such object".to_string(),
            });
        }
        Ok(format!("memory://objects/{}?expires_in={}", key, ttl.as_secs()))
    }
}
