#![allow(dead_code)]

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use resize_service::jobs::{InMemoryJobLedger, JobError, JobId, JobLedger, JobResult};
use resize_service::services::{BatchOrchestrator, ResizePipeline};
use resize_service::storage::{InMemoryObjectStore, ObjectStore, StorageError, StorageResult};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PRESIGN_TTL: Duration = Duration::from_secs(600);

/// Smooth gradient test image encoded as `format`.
pub fn sample_image(width: u32, height: u32, format: ImageFormat) -> Bytes {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    Bytes::from(buf)
}

pub fn jpeg(width: u32, height: u32) -> Bytes {
    sample_image(width, height, ImageFormat::Jpeg)
}

pub fn png(width: u32, height: u32) -> Bytes {
    sample_image(width, height, ImageFormat::Png)
}

/// High-entropy JPEG; stays well above a few KB at any quality.
pub fn noisy_jpeg(width: u32, height: u32) -> Bytes {
    let mut state: u32 = 0x9e37_79b9;
    let img = RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        Rgb([state as u8, (state >> 8) as u8, (state >> 16) as u8])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    Bytes::from(buf)
}

/// In-memory ledger that also keeps every progress write, in order.
#[derive(Clone, Default)]
pub struct RecordingLedger {
    inner: InMemoryJobLedger,
    writes: Arc<Mutex<Vec<(JobId, u8)>>>,
}

impl RecordingLedger {
    pub fn history(&self, id: &JobId) -> Vec<u8> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(job, _)| job == id)
            .map(|(_, progress)| *progress)
            .collect()
    }

    pub fn job_count(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait::async_trait]
impl JobLedger for RecordingLedger {
    async fn create_job(&self, id: &JobId) -> JobResult<()> {
        self.inner.create_job(id).await?;
        self.writes.lock().unwrap().push((id.clone(), 0));
        Ok(())
    }

    async fn set_progress(&self, id: &JobId, progress: u8) -> JobResult<()> {
        self.inner.set_progress(id, progress).await?;
        self.writes.lock().unwrap().push((id.clone(), progress));
        Ok(())
    }

    async fn get_progress(&self, id: &JobId) -> JobResult<u8> {
        self.inner.get_progress(id).await
    }

    async fn ping(&self) -> JobResult<()> {
        Ok(())
    }
}

/// Ledger whose backend is always down.
pub struct UnavailableLedger;

#[async_trait::async_trait]
impl JobLedger for UnavailableLedger {
    async fn create_job(&self, _id: &JobId) -> JobResult<()> {
        Err(JobError::LedgerUnavailable("connection refused".to_string()))
    }

    async fn set_progress(&self, _id: &JobId, _progress: u8) -> JobResult<()> {
        Err(JobError::LedgerUnavailable("connection refused".to_string()))
    }

    async fn get_progress(&self, _id: &JobId) -> JobResult<u8> {
        Err(JobError::LedgerUnavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> JobResult<()> {
        Err(JobError::LedgerUnavailable("connection refused".to_string()))
    }
}

/// Object store that rejects uploads or presigns on request.
#[derive(Clone, Default)]
pub struct FaultyStore {
    pub inner: InMemoryObjectStore,
    pub fail_put: bool,
    pub fail_presign: bool,
}

#[async_trait::async_trait]
impl ObjectStore for FaultyStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<()> {
        if self.fail_put {
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: "access denied".to_string(),
            });
        }
        self.inner.put(key, body, content_type).await
    }

    async fn presign(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        if self.fail_presign {
            return Err(StorageError::Presign {
                key: key.to_string(),
                message: "signing key unavailable".to_string(),
            });
        }
        self.inner.presign(key, ttl).await
    }
}

pub struct Harness {
    pub ledger: RecordingLedger,
    pub store: InMemoryObjectStore,
    pub pipeline: ResizePipeline,
}

impl Harness {
    pub fn new() -> Self {
        let ledger = RecordingLedger::default();
        let store = InMemoryObjectStore::new();
        let pipeline = ResizePipeline::new(
            Arc::new(ledger.clone()),
            Arc::new(store.clone()),
            PRESIGN_TTL,
        );
        Self {
            ledger,
            store,
            pipeline,
        }
    }

    pub fn orchestrator(&self, concurrency: usize) -> BatchOrchestrator {
        BatchOrchestrator::new(self.pipeline.clone()).with_concurrency(concurrency)
    }
}
