//! Service layer
//!
//! - `pipeline`: one image through transform, upload and presign, with ledger checkpoints
//! - `batch`: fan-out of many images through the same stages, collecting per-item outcomes

pub mod batch;
pub mod pipeline;

pub use batch::{BatchItem, BatchOrchestrator, BatchResult, ItemOutcome};
pub use pipeline::{ResizeOutcome, ResizePipeline};

use crate::error::{AppError, Result};
use crate::imaging::{self, BudgetOutcome, EncodeSpec, ResizeSpec};
use bytes::Bytes;

/// Run decode, resize and budget-encode on the blocking pool.
pub async fn transform_blocking(
    data: Bytes,
    resize_spec: ResizeSpec,
    encode_spec: EncodeSpec,
) -> Result<BudgetOutcome> {
    tokio::task::spawn_blocking(move || imaging::transform(&data, &resize_spec, &encode_spec))
        .await
        .map_err(|e| AppError::Internal(format!("Image task panicked: {e}")))?
        .map_err(AppError::from)
}
