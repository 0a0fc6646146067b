//! Request parameters and response bodies
//!
//! Transform parameters arrive as multipart text fields and are validated
//! into `ResizeSpec`/`EncodeSpec` before any image work starts.

use crate::error::{AppError, Result};
use crate::imaging::{budget::DEFAULT_QUALITY, EncodeSpec, ImageFamily, ResizeSpec};
use crate::jobs::JobId;
use crate::services::{BatchResult, ItemOutcome, ResizeOutcome};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Transform fields shared by the single and batch endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformParams {
    pub width: i64,
    pub height: i64,
    /// `false` selects center-crop-to-fill when both dimensions are set
    pub maintain_aspect_ratio: bool,
    pub quality: i64,
    pub max_size_kb: i64,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            maintain_aspect_ratio: false,
            quality: i64::from(DEFAULT_QUALITY),
            max_size_kb: 0,
        }
    }
}

impl TransformParams {
    /// Parse from multipart text fields. Absent or blank fields take their defaults.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            width: int_field(fields, "width", defaults.width)?,
            height: int_field(fields, "height", defaults.height)?,
            maintain_aspect_ratio: bool_field(fields, "maintain_aspect_ratio"),
            quality: int_field(fields, "quality", defaults.quality)?,
            max_size_kb: int_field(fields, "max_size_kb", defaults.max_size_kb)?,
        })
    }

    pub fn resize_spec(&self) -> Result<ResizeSpec> {
        Ok(ResizeSpec::new(
            self.width,
            self.height,
            !self.maintain_aspect_ratio,
        )?)
    }

    pub fn encode_spec(&self) -> Result<EncodeSpec> {
        Ok(EncodeSpec::new(self.quality, self.max_size_kb)?)
    }
}

fn int_field(fields: &HashMap<String, String>, name: &str, default: i64) -> Result<i64> {
    match fields.get(name).map(|v| v.trim()) {
        None | Some("") => Ok(default),
        Some(value) => value.parse().map_err(|_| {
            AppError::BadRequest(format!("{name} must be an integer (got {value:?})"))
        }),
    }
}

fn bool_field(fields: &HashMap<String, String>, name: &str) -> bool {
    fields
        .get(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeResponse {
    pub job_id: JobId,
    pub download_url: String,
    pub format: ImageFamily,
    pub object_name: String,
    pub size_budget_met: bool,
}

impl From<ResizeOutcome> for ResizeResponse {
    fn from(outcome: ResizeOutcome) -> Self {
        Self {
            job_id: outcome.job_id,
            download_url: outcome.download_url,
            format: outcome.format,
            object_name: outcome.object_name,
            size_budget_met: outcome.size_budget_met,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub message: String,
    pub batch_job_id: JobId,
    pub image_jobs: Vec<ItemOutcome>,
}

impl From<BatchResult> for BatchResponse {
    fn from(result: BatchResult) -> Self {
        let total = result.image_jobs.len();
        let failed = result.failed_count();
        let message = if failed == 0 {
            format!("Batch processing completed: {total} images processed")
        } else {
            format!(
                "Batch processing completed: {} of {total} images processed, {failed} failed",
                total - failed
            )
        };

        Self {
            message,
            batch_job_id: result.batch_job_id,
            image_jobs: result.image_jobs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub job_id: JobId,
    pub progress: u8,
}
