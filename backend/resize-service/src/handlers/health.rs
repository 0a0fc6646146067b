use crate::metrics;
use crate::services::ResizePipeline;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::warn;

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// GET /health/ready: the job ledger must be reachable.
pub async fn readiness(pipeline: web::Data<ResizePipeline>) -> HttpResponse {
    match pipeline.ledger().ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({"status": "ready"})),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unavailable",
                "ledger": e.to_string(),
            }))
        }
    }
}

/// GET /metrics
pub async fn metrics_endpoint() -> HttpResponse {
    match metrics::render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}
