//! HTTP handlers
//!
//! - `resize`: single image upload
//! - `batch`: multi-image upload with per-item outcomes
//! - `progress`: job progress polling
//! - `health`: liveness, readiness and Prometheus metrics

pub mod batch;
pub mod form;
pub mod health;
pub mod progress;
pub mod resize;

pub use batch::batch_resize;
pub use health::{health, metrics_endpoint, readiness};
pub use progress::get_progress;
pub use resize::resize_image;

use actix_web::web;

/// Register every route. Expects `ResizePipeline`, `BatchOrchestrator` and
/// `ProcessingConfig` as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/health/ready", web::get().to(readiness))
        .route("/metrics", web::get().to(metrics_endpoint))
        .service(
            web::scope("/api")
                .route("/resize", web::post().to(resize_image))
                .route("/batch", web::post().to(batch_resize))
                .route("/progress/{job_id}", web::get().to(get_progress)),
        );
}
