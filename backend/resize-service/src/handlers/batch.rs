use super::form::{UploadForm, UploadedFile};
use crate::config::ProcessingConfig;
use crate::error::Result;
use crate::models::BatchResponse;
use crate::services::BatchOrchestrator;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

/// POST /api/batch
///
/// Per-image failures are reported inside `image_jobs`; the request only
/// fails when the form is invalid or the batch job cannot be created.
pub async fn batch_resize(
    orchestrator: web::Data<BatchOrchestrator>,
    processing: web::Data<ProcessingConfig>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = UploadForm::read(payload, &processing).await?;
    let params = form.transform_params()?;
    let resize_spec = params.resize_spec()?;
    let encode_spec = params.encode_spec()?;

    let items = form
        .take_files("images")
        .into_iter()
        .map(UploadedFile::into_batch_item)
        .collect();

    let result = orchestrator
        .run_batch(items, resize_spec, encode_spec)
        .await?;
    Ok(HttpResponse::Ok().json(BatchResponse::from(result)))
}
