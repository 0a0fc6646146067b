//! S3 client wrapper for the resize services
//!
//! Thin layer over `aws-sdk-s3` covering what the image pipeline needs:
//! uploading encoded artifacts and issuing presigned download links.
//! Works against AWS S3 and S3-compatible stores such as MinIO.

use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

pub mod config;

pub use config::S3Config;

#[derive(Error, Debug)]
pub enum S3Error {
    #[error("S3 upload failed for {key}: {message}")]
    Upload { key: String, message: String },

    #[error("Failed to presign {key}: {message}")]
    Presign { key: String, message: String },

    #[error("S3 health check failed for bucket {bucket}: {message}")]
    Health { bucket: String, message: String },
}

/// Shared S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Client {
    /// Create a client with custom configuration
    ///
    /// Static credentials are used when both halves are configured, otherwise the
    /// default AWS credential chain applies.
    pub async fn with_config(config: S3Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "resize_service_s3",
            );
            loader = loader.credentials_provider(credentials);
        }

        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            bucket = %config.bucket,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "S3 client initialized"
        );

        Self {
            client: Arc::new(Client::from_conf(builder.build())),
            config,
        }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Upload an object with the given content type
    pub async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), S3Error> {
        let size = body.len();
        debug!(key = %key, content_type = %content_type, size, "Uploading object");

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                error!(key = %key, error = %message, "Failed to upload object");
                S3Error::Upload {
                    key: key.to_string(),
                    message,
                }
            })?;

        Ok(())
    }

    /// Presigned GET URL that downloads the object as an attachment
    pub async fn presigned_download_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, S3Error> {
        let presigning_config = PresigningConfig::expires_in(expires_in).map_err(|e| {
            S3Error::Presign {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;

        let request = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .response_content_disposition("attachment")
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                error!(key = %key, error = %message, "Failed to presign object");
                S3Error::Presign {
                    key: key.to_string(),
                    message,
                }
            })?;

        debug!(key = %key, "Generated presigned URL");
        Ok(request.uri().to_string())
    }

    /// Health check for bucket reachability
    pub async fn health_check(&self) -> Result<(), S3Error> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| S3Error::Health {
                bucket: self.config.bucket.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}
