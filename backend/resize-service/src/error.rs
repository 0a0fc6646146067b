//! Error types for the resize service
//!
//! Every layer error converts into [`AppError`], which renders the shared
//! `error_types::ErrorResponse` JSON body.

use crate::imaging::ImageError;
use crate::jobs::{JobError, JobId};
use crate::storage::StorageError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Failed to upload image: {0}")]
    Upload(String),

    #[error("Failed to get download URL: {0}")]
    Presign(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Failure of a request that already has a job id; the id is echoed in the body.
    #[error("{source}")]
    WithJob {
        job_id: JobId,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Attach the job the failing request was tracked under.
    pub fn with_job(self, job_id: &JobId) -> Self {
        match self {
            already @ AppError::WithJob { .. } => already,
            other => AppError::WithJob {
                job_id: job_id.clone(),
                source: Box::new(other),
            },
        }
    }

    /// Innermost error, skipping any job wrapper.
    pub fn kind(&self) -> &AppError {
        match self {
            AppError::WithJob { source, .. } => source.kind(),
            other => other,
        }
    }

    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            AppError::WithJob { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// `(error_type, code)` pair for the response body
    fn classification(&self) -> (&'static str, &'static str) {
        match self.kind() {
            AppError::BadRequest(_) => (kinds::VALIDATION_ERROR, error_codes::INVALID_REQUEST),
            AppError::InvalidDimensions(_) => {
                (kinds::VALIDATION_ERROR, error_codes::INVALID_DIMENSIONS)
            }
            AppError::InvalidParameters(_) => {
                (kinds::VALIDATION_ERROR, error_codes::INVALID_PARAMETERS)
            }
            AppError::PayloadTooLarge(_) => {
                (kinds::VALIDATION_ERROR, error_codes::UPLOAD_TOO_LARGE)
            }
            AppError::Decode(_) => (kinds::PROCESSING_ERROR, error_codes::UNSUPPORTED_FORMAT),
            AppError::Encode(_) => (
                kinds::PROCESSING_ERROR,
                error_codes::MEDIA_PROCESSING_FAILED,
            ),
            AppError::JobNotFound(_) => (kinds::NOT_FOUND_ERROR, error_codes::JOB_NOT_FOUND),
            AppError::LedgerUnavailable(_) => (
                kinds::SERVICE_UNAVAILABLE_ERROR,
                error_codes::LEDGER_UNAVAILABLE,
            ),
            AppError::Upload(_) => (kinds::STORAGE_ERROR, error_codes::UPLOAD_FAILED),
            AppError::Presign(_) => (kinds::STORAGE_ERROR, error_codes::PRESIGN_FAILED),
            AppError::Internal(_) | AppError::WithJob { .. } => {
                (kinds::SERVER_ERROR, error_codes::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            AppError::BadRequest(_)
            | AppError::InvalidDimensions(_)
            | AppError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::JobNotFound(_) => StatusCode::NOT_FOUND,
            AppError::LedgerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upload(_) | AppError::Presign(_) => StatusCode::BAD_GATEWAY,
            AppError::Encode(_) | AppError::Internal(_) | AppError::WithJob { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error_type, code) = self.classification();

        let mut response = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            &self.kind().to_string(),
            status.as_u16(),
            error_type,
            code,
        );
        if let Some(job_id) = self.job_id() {
            response = response.with_job_id(job_id.to_string());
        }

        HttpResponse::build(status).json(response)
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Decode(msg) => AppError::Decode(msg),
            ImageError::Encode { family, message } => {
                AppError::Encode(format!("{family}: {message}"))
            }
            ImageError::InvalidDimensions(msg) => AppError::InvalidDimensions(msg),
            ImageError::InvalidParameters(msg) => AppError::InvalidParameters(msg),
        }
    }
}

impl From<JobError> for AppError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => AppError::JobNotFound(id.to_string()),
            JobError::LedgerUnavailable(msg) => AppError::LedgerUnavailable(msg),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Upload { key, message } => AppError::Upload(format!("{key}: {message}")),
            StorageError::Presign { key, message } => {
                AppError::Presign(format!("{key}: {message}"))
            }
        }
    }
}
