//! Batch orchestration
//!
//! Every item gets its own child job and runs read -> transform -> upload ->
//! presign independently. A failing stage becomes that item's failure record;
//! the batch itself only fails when it cannot start.

use super::pipeline::ResizePipeline;
use crate::error::{AppError, Result};
use crate::imaging::{EncodeSpec, ImageFamily, ResizeSpec};
use crate::jobs::{batch_progress, checkpoint, JobId};
use crate::metrics;
use crate::storage::keys;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::fmt;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// One uploaded file. `content` holds the read error when the upload could not be read.
#[derive(Debug)]
pub struct BatchItem {
    pub filename: String,
    pub content: std::result::Result<Bytes, String>,
}

impl BatchItem {
    pub fn new(filename: impl Into<String>, content: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content: Ok(content),
        }
    }

    pub fn unreadable(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: Err(reason.into()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ItemSuccess {
    pub job_id: JobId,
    pub filename: String,
    pub download_url: String,
    pub format: ImageFamily,
    pub object_name: String,
    pub size_budget_met: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ItemFailure {
    pub job_id: JobId,
    pub filename: String,
    pub error: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ItemOutcome {
    Succeeded(ItemSuccess),
    Failed(ItemFailure),
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded(_))
    }

    pub fn job_id(&self) -> &JobId {
        match self {
            ItemOutcome::Succeeded(s) => &s.job_id,
            ItemOutcome::Failed(f) => &f.job_id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BatchResult {
    pub batch_job_id: JobId,
    /// Per-item outcomes in input order
    pub image_jobs: Vec<ItemOutcome>,
}

impl BatchResult {
    pub fn failed_count(&self) -> usize {
        self.image_jobs.iter().filter(|o| !o.is_success()).count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ItemStage {
    Read,
    Resize,
    Upload,
    Presign,
}

impl ItemStage {
    fn as_str(&self) -> &'static str {
        match self {
            ItemStage::Read => "read",
            ItemStage::Resize => "resize",
            ItemStage::Upload => "upload",
            ItemStage::Presign => "presign",
        }
    }
}

#[derive(Debug)]
struct StageFailure {
    stage: ItemStage,
    message: String,
}

impl StageFailure {
    fn new(stage: ItemStage, err: impl fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            ItemStage::Read => write!(f, "Failed to read image: {}", self.message),
            ItemStage::Resize => write!(f, "Resize failed: {}", self.message),
            ItemStage::Upload => write!(f, "Failed to upload image: {}", self.message),
            ItemStage::Presign => write!(f, "Failed to get download URL: {}", self.message),
        }
    }
}

#[derive(Clone)]
pub struct BatchOrchestrator {
    pipeline: ResizePipeline,
    concurrency: usize,
}

impl BatchOrchestrator {
    pub fn new(pipeline: ResizePipeline) -> Self {
        Self {
            pipeline,
            concurrency: 1,
        }
    }

    /// Process up to `concurrency` items at once; outcomes stay in input order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn pipeline(&self) -> &ResizePipeline {
        &self.pipeline
    }

    pub async fn run_batch(
        &self,
        items: Vec<BatchItem>,
        resize_spec: ResizeSpec,
        encode_spec: EncodeSpec,
    ) -> Result<BatchResult> {
        if items.is_empty() {
            return Err(AppError::BadRequest("No images provided".to_string()));
        }
        if resize_spec.is_noop() {
            return Err(AppError::InvalidDimensions(
                "width and height cannot both be zero".to_string(),
            ));
        }

        let batch_job_id = self.pipeline.create_job().await?;
        let total = items.len();
        info!(batch_job_id = %batch_job_id, total, concurrency = self.concurrency, "Batch started");

        // held across the ledger write so parent progress never goes backwards
        let processed = Mutex::new(0usize);

        let image_jobs: Vec<ItemOutcome> = stream::iter(items)
            .map(|item| {
                let batch_job_id = &batch_job_id;
                let processed = &processed;
                async move {
                    let outcome = self
                        .process_item(batch_job_id, item, resize_spec, encode_spec)
                        .await;

                    let mut done = processed.lock().await;
                    *done += 1;
                    self.pipeline
                        .checkpoint(batch_job_id, batch_progress(*done, total))
                        .await;
                    outcome
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        self.pipeline.complete(&batch_job_id).await;

        let result = BatchResult {
            batch_job_id,
            image_jobs,
        };
        info!(
            batch_job_id = %result.batch_job_id,
            total,
            failed = result.failed_count(),
            "Batch finished"
        );
        Ok(result)
    }

    async fn process_item(
        &self,
        batch_job_id: &JobId,
        item: BatchItem,
        resize_spec: ResizeSpec,
        encode_spec: EncodeSpec,
    ) -> ItemOutcome {
        let job_id = JobId::generate();
        self.pipeline.register_job(&job_id).await;
        self.pipeline.checkpoint(&job_id, checkpoint::STARTED).await;

        let BatchItem { filename, content } = item;
        let result = self
            .item_stages(batch_job_id, &job_id, content, resize_spec, encode_spec)
            .await;

        // the child is completed either way; its outcome lives in the batch result
        self.pipeline.complete(&job_id).await;

        let outcome = match result {
            Ok((object_name, download_url, format, size_budget_met)) => {
                ItemOutcome::Succeeded(ItemSuccess {
                    job_id,
                    filename,
                    download_url,
                    format,
                    object_name,
                    size_budget_met,
                })
            }
            Err(failure) => {
                if failure.stage == ItemStage::Read {
                    metrics::record_pipeline_failure(failure.stage.as_str());
                }
                warn!(
                    batch_job_id = %batch_job_id,
                    job_id = %job_id,
                    filename = %filename,
                    stage = failure.stage.as_str(),
                    error = %failure.message,
                    "Batch item failed"
                );
                ItemOutcome::Failed(ItemFailure {
                    job_id,
                    filename,
                    error: failure.to_string(),
                })
            }
        };
        metrics::record_batch_item(outcome.is_success());
        outcome
    }

    async fn item_stages(
        &self,
        batch_job_id: &JobId,
        job_id: &JobId,
        content: std::result::Result<Bytes, String>,
        resize_spec: ResizeSpec,
        encode_spec: EncodeSpec,
    ) -> std::result::Result<(String, String, ImageFamily, bool), StageFailure> {
        let data = content.map_err(|e| StageFailure::new(ItemStage::Read, e))?;
        self.pipeline.checkpoint(job_id, checkpoint::INPUT_RECEIVED).await;

        let outcome = self
            .pipeline
            .transform(data, resize_spec, encode_spec)
            .await
            .map_err(|e| StageFailure::new(ItemStage::Resize, e))?;
        self.pipeline.checkpoint(job_id, checkpoint::ENCODED).await;

        let size_budget_met = outcome.budget_met();
        let artifact = outcome.into_artifact();
        let object_name = keys::batch(batch_job_id, artifact.family.extension());

        self.pipeline
            .upload(&object_name, &artifact)
            .await
            .map_err(|e| StageFailure::new(ItemStage::Upload, e))?;
        self.pipeline.checkpoint(job_id, checkpoint::UPLOADED).await;

        let download_url = self
            .pipeline
            .presign(&object_name)
            .await
            .map_err(|e| StageFailure::new(ItemStage::Presign, e))?;

        Ok((object_name, download_url, artifact.family, size_budget_met))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_messages() {
        assert_eq!(
            StageFailure::new(ItemStage::Read, "too large").to_string(),
            "Failed to read image: too large"
        );
        assert_eq!(
            StageFailure::new(ItemStage::Resize, "bad bytes").to_string(),
            "Resize failed: bad bytes"
        );
        assert_eq!(
            StageFailure::new(ItemStage::Upload, "denied").to_string(),
            "Failed to upload image: denied"
        );
        assert_eq!(
            StageFailure::new(ItemStage::Presign, "expired").to_string(),
            "Failed to get download URL: expired"
        );
    }

    #[test]
    fn test_item_outcomes_serialize_flat() {
        let failed = ItemOutcome::Failed(ItemFailure {
            job_id: JobId::from("child-1"),
            filename: "b.png".to_string(),
            error: "Resize failed: nope".to_string(),
        });
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["job_id"], "child-1");
        assert_eq!(json["error"], "Resize failed: nope");
        assert!(json.get("download_url").is_none());

        let ok = ItemOutcome::Succeeded(ItemSuccess {
            job_id: JobId::from("child-2"),
            filename: "a.jpg".to_string(),
            download_url: "https://example/a".to_string(),
            format: ImageFamily::Jpeg,
            object_name: "batch/p_x.jpg".to_string(),
            size_budget_met: true,
        });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["format"], "jpeg");
        assert!(json.get("error").is_none());
    }
}
