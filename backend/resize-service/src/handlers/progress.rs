use crate::error::Result;
use crate::jobs::JobId;
use crate::models::ProgressResponse;
use crate::services::ResizePipeline;
use actix_web::{web, HttpResponse};

/// GET /api/progress/{job_id}
pub async fn get_progress(
    pipeline: web::Data<ResizePipeline>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let job_id = JobId::from(path.into_inner());
    let progress = pipeline.ledger().get_progress(&job_id).await?;

    Ok(HttpResponse::Ok().json(ProgressResponse { job_id, progress }))
}
