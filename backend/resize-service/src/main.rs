//! Resize Service - HTTP Server

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use resize_service::handlers;
use resize_service::jobs::{JobLedger, RedisJobLedger};
use resize_service::services::{BatchOrchestrator, ResizePipeline};
use resize_service::storage::{ObjectStore, S3ObjectStore};
use resize_service::Config;
use s3_utils::S3Client;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

fn init_tracing(json: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,resize_service=debug".into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
        }))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.json_logs());

    info!(
        env = %config.app.env,
        bucket = %config.s3.bucket,
        batch_concurrency = config.processing.batch_concurrency,
        "Starting resize service"
    );

    let ledger: Arc<dyn JobLedger> = Arc::new(
        RedisJobLedger::connect(&config.cache.redis_url, config.jobs.ttl_secs)
            .await
            .context("Failed to connect to Redis")?,
    );

    let s3_client = S3Client::with_config(config.s3.clone()).await;
    if let Err(e) = s3_client.health_check().await {
        warn!(error = %e, "S3 bucket not reachable at startup; uploads will fail until it is");
    }
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(s3_client));

    let pipeline = ResizePipeline::new(ledger, store, config.s3.presigned_url_ttl());
    let orchestrator = BatchOrchestrator::new(pipeline.clone())
        .with_concurrency(config.processing.batch_concurrency);
    let processing = config.processing.clone();

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    info!(address = %bind_address, "HTTP server listening");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(web::Data::new(orchestrator.clone()))
            .app_data(web::Data::new(processing.clone()))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("HTTP server terminated with an error")?;

    Ok(())
}
