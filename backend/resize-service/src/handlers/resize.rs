use super::form::UploadForm;
use crate::config::ProcessingConfig;
use crate::error::{AppError, Result};
use crate::jobs::{checkpoint, JobId};
use crate::metrics;
use crate::models::ResizeResponse;
use crate::services::{ResizeOutcome, ResizePipeline};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use tracing::info;

/// POST /api/resize
///
/// The job is created before the form is read, so every later failure can
/// report the job id it was tracked under.
pub async fn resize_image(
    pipeline: web::Data<ResizePipeline>,
    processing: web::Data<ProcessingConfig>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let job_id = pipeline.create_job().await?;
    pipeline.checkpoint(&job_id, checkpoint::STARTED).await;
    info!(job_id = %job_id, "Resize request accepted");

    let outcome = process_upload(&pipeline, &processing, &job_id, payload)
        .await
        .map_err(|e| e.with_job(&job_id))?;

    Ok(HttpResponse::Ok().json(ResizeResponse::from(outcome)))
}

async fn process_upload(
    pipeline: &ResizePipeline,
    processing: &ProcessingConfig,
    job_id: &JobId,
    payload: Multipart,
) -> Result<ResizeOutcome> {
    let mut form = UploadForm::read(payload, processing).await?;
    let params = form.transform_params()?;
    let resize_spec = params.resize_spec()?;
    let encode_spec = params.encode_spec()?;
    if resize_spec.is_noop() {
        return Err(AppError::InvalidDimensions(
            "width and height cannot both be zero".to_string(),
        ));
    }
    pipeline.checkpoint(job_id, checkpoint::FORM_PARSED).await;

    let file = form
        .take_file("image")
        .ok_or_else(|| AppError::BadRequest("No image file provided".to_string()))?;
    pipeline.checkpoint(job_id, checkpoint::INPUT_RECEIVED).await;

    let data = file
        .content
        .inspect_err(|_| metrics::record_pipeline_failure("read"))?;
    pipeline.checkpoint(job_id, checkpoint::INPUT_READ).await;
    info!(job_id = %job_id, filename = %file.filename, size = data.len(), "Image received");

    pipeline.run(job_id, data, resize_spec, encode_spec).await
}
