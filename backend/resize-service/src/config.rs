//! Configuration management for the resize service
//!
//! Loads configuration from environment variables with sensible defaults.
//! Malformed numeric values are rejected rather than silently defaulted.

use crate::jobs::DEFAULT_JOB_TTL_SECS;
use s3_utils::S3Config;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

/// Default per-file upload limit (32 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Default limit for a whole multipart body (64 MiB)
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

/// Default limit on files in one request
pub const DEFAULT_MAX_FILES: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cache: CacheConfig,
    pub jobs: JobsConfig,
    pub s3: S3Config,
    pub processing: ProcessingConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
    /// `json` for structured log lines, anything else for human-readable output
    pub log_format: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CacheConfig {
    pub redis_url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct JobsConfig {
    /// Lifetime of a job record after its last progress write
    pub ttl_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProcessingConfig {
    /// Per-file limit
    pub max_upload_bytes: usize,
    /// Limit on all multipart bytes of one request, files and text fields alike
    pub max_request_bytes: usize,
    pub max_files: usize,
    /// Batch items processed at once; 1 keeps items strictly sequential
    pub batch_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("APP_PORT", 8081)?,
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            },
            cache: CacheConfig {
                redis_url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            jobs: JobsConfig {
                ttl_secs: parse_var("JOB_TTL_SECS", DEFAULT_JOB_TTL_SECS)?,
            },
            s3: S3Config::from_env(),
            processing: ProcessingConfig {
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
                max_request_bytes: parse_var("MAX_REQUEST_BYTES", DEFAULT_MAX_REQUEST_BYTES)?,
                max_files: parse_var("MAX_FILES", DEFAULT_MAX_FILES)?.max(1),
                batch_concurrency: parse_var("BATCH_CONCURRENCY", 1usize)?.max(1),
            },
        })
    }

    pub fn json_logs(&self) -> bool {
        self.app.log_format.eq_ignore_ascii_case("json")
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_defaults_when_unset() {
        let value: u64 = parse_var("RESIZE_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        std::env::set_var("RESIZE_TEST_GARBAGE_PORT", "eighty");
        let result: Result<u16, _> = parse_var("RESIZE_TEST_GARBAGE_PORT", 8081);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "RESIZE_TEST_GARBAGE_PORT", .. })
        ));
    }

    #[test]
    fn test_parse_var_reads_value() {
        std::env::set_var("RESIZE_TEST_CONCURRENCY", " 4 ");
        let value: usize = parse_var("RESIZE_TEST_CONCURRENCY", 1).unwrap();
        assert_eq!(value, 4);
    }
}
