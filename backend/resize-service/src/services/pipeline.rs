//! Single-image pipeline
//!
//! transform (60) -> upload (80) -> presign -> complete (100). The caller owns
//! the earlier checkpoints because it reads the upload itself.

use super::transform_blocking;
use crate::error::{AppError, Result};
use crate::imaging::{BudgetOutcome, EncodeSpec, EncodedArtifact, ImageFamily, ResizeSpec};
use crate::jobs::{checkpoint, record_complete, record_progress, JobId, JobLedger};
use crate::metrics;
use crate::storage::{keys, ObjectStore};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of a successful single-image run.
#[derive(Clone, Debug)]
pub struct ResizeOutcome {
    pub job_id: JobId,
    pub download_url: String,
    pub format: ImageFamily,
    pub object_name: String,
    pub size_budget_met: bool,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
    pub quality: u8,
}

#[derive(Clone)]
pub struct ResizePipeline {
    ledger: Arc<dyn JobLedger>,
    store: Arc<dyn ObjectStore>,
    presign_ttl: Duration,
}

impl ResizePipeline {
    pub fn new(ledger: Arc<dyn JobLedger>, store: Arc<dyn ObjectStore>, presign_ttl: Duration) -> Self {
        Self {
            ledger,
            store,
            presign_ttl,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn JobLedger> {
        &self.ledger
    }

    /// Register a fresh job at progress 0. Fails if the ledger cannot be written.
    pub async fn create_job(&self) -> Result<JobId> {
        let job_id = JobId::generate();
        self.ledger.create_job(&job_id).await?;
        metrics::record_job_created();
        debug!(job_id = %job_id, "Job registered");
        Ok(job_id)
    }

    /// Register `job_id`, logging instead of failing when the ledger is unavailable.
    pub async fn register_job(&self, job_id: &JobId) {
        match self.ledger.create_job(job_id).await {
            Ok(()) => metrics::record_job_created(),
            Err(e) => warn!(job_id = %job_id, error = %e, "Failed to register job"),
        }
    }

    pub async fn checkpoint(&self, job_id: &JobId, progress: u8) {
        record_progress(self.ledger.as_ref(), job_id, progress).await;
    }

    pub async fn complete(&self, job_id: &JobId) {
        record_complete(self.ledger.as_ref(), job_id).await;
    }

    /// Decode, resize and budget-encode off the async runtime.
    pub async fn transform(
        &self,
        data: Bytes,
        resize_spec: ResizeSpec,
        encode_spec: EncodeSpec,
    ) -> Result<BudgetOutcome> {
        let outcome = transform_blocking(data, resize_spec, encode_spec)
            .await
            .inspect_err(|_| metrics::record_pipeline_failure("resize"))?;

        metrics::record_budget_outcome(outcome.label());
        let artifact = outcome.artifact();
        debug!(
            format = %artifact.family,
            width = artifact.width,
            height = artifact.height,
            quality = artifact.quality,
            size = artifact.len(),
            budget_met = outcome.budget_met(),
            "Image transformed"
        );
        Ok(outcome)
    }

    pub async fn upload(&self, key: &str, artifact: &EncodedArtifact) -> Result<()> {
        self.store
            .put(key, artifact.bytes.clone(), artifact.content_type())
            .await
            .map_err(|e| {
                metrics::record_pipeline_failure("upload");
                AppError::from(e)
            })
    }

    pub async fn presign(&self, key: &str) -> Result<String> {
        self.store.presign(key, self.presign_ttl).await.map_err(|e| {
            metrics::record_pipeline_failure("presign");
            AppError::from(e)
        })
    }

    /// Run an already-read upload through the remaining stages of `job_id`.
    /// Errors carry the job id.
    pub async fn run(
        &self,
        job_id: &JobId,
        data: Bytes,
        resize_spec: ResizeSpec,
        encode_spec: EncodeSpec,
    ) -> Result<ResizeOutcome> {
        self.run_stages(job_id, data, resize_spec, encode_spec)
            .await
            .map_err(|e| e.with_job(job_id))
    }

    async fn run_stages(
        &self,
        job_id: &JobId,
        data: Bytes,
        resize_spec: ResizeSpec,
        encode_spec: EncodeSpec,
    ) -> Result<ResizeOutcome> {
        let outcome = self.transform(data, resize_spec, encode_spec).await?;
        self.checkpoint(job_id, checkpoint::ENCODED).await;

        let size_budget_met = outcome.budget_met();
        let artifact = outcome.into_artifact();
        let object_name = keys::single(artifact.family.extension());

        self.upload(&object_name, &artifact).await?;
        self.checkpoint(job_id, checkpoint::UPLOADED).await;

        let download_url = self.presign(&object_name).await?;
        self.complete(job_id).await;

        info!(
            job_id = %job_id,
            object_name = %object_name,
            format = %artifact.family,
            size = artifact.len(),
            quality = artifact.quality,
            size_budget_met,
            "Image resized"
        );

        Ok(ResizeOutcome {
            job_id: job_id.clone(),
            download_url,
            format: artifact.family,
            object_name,
            size_budget_met,
            width: artifact.width,
            height: artifact.height,
            size_bytes: artifact.len(),
            quality: artifact.quality,
        })
    }
}
