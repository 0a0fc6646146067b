//! S3 configuration for the object store sink

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default presigned download URL lifetime (10 minutes)
pub const DEFAULT_PRESIGNED_URL_TTL_SECS: u64 = 600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Custom endpoint for S3-compatible storage (MinIO)
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Use path-style addressing (`endpoint/bucket/key`); required by MinIO
    pub force_path_style: bool,
    /// Presigned download URL lifetime in seconds
    pub presigned_url_ttl_secs: u64,
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "images".to_string()),
            region: std::env::var("S3_REGION")
                .or_else(|_| std::env::var("AWS_REGION"))
                .unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint: non_empty_var("S3_ENDPOINT").map(|endpoint| normalize_endpoint(&endpoint)),
            access_key_id: non_empty_var("S3_ACCESS_KEY"),
            secret_access_key: non_empty_var("S3_SECRET_KEY"),
            force_path_style: std::env::var("S3_FORCE_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            presigned_url_ttl_secs: std::env::var("PRESIGNED_URL_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PRESIGNED_URL_TTL_SECS),
        }
    }

    pub fn presigned_url_ttl(&self) -> Duration {
        Duration::from_secs(self.presigned_url_ttl_secs)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// MinIO deployments are usually configured as bare `host:port`.
fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}
