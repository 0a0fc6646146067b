//! Shared API error body for the resize services.
use serde::{Deserialize, Serialize};

/// Uniform JSON error payload returned by every HTTP endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short human label for the HTTP status ("Not Found", "Bad Request", ...)
    pub error: String,

    /// User-facing description of what went wrong
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Error category used by clients for routing:
    /// - "validation_error" - request parameters rejected
    /// - "processing_error" - the image could not be decoded or encoded
    /// - "not_found_error" - job record absent or expired
    /// - "storage_error" - object store rejected the upload or presign
    /// - "server_error" - internal fault
    /// - "service_unavailable_error" - a backing store is unreachable
    pub error_type: String,

    /// Stable machine-readable code, e.g. "JOB_NOT_FOUND"
    pub code: String,

    /// Job the failed request was tracked under, when one was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,

    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            job_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_job_id(mut self, job_id: String) -> Self {
        self.job_id = Some(job_id);
        self
    }
}

/// Standard error codes
pub mod error_codes {
    // Request validation
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const INVALID_DIMENSIONS: &str = "INVALID_DIMENSIONS";
    pub const INVALID_PARAMETERS: &str = "INVALID_PARAMETERS";
    pub const UPLOAD_TOO_LARGE: &str = "UPLOAD_TOO_LARGE";

    // Image processing
    pub const UNSUPPORTED_FORMAT: &str = "UNSUPPORTED_FORMAT";
    pub const MEDIA_PROCESSING_FAILED: &str = "MEDIA_PROCESSING_FAILED";

    // Jobs
    pub const JOB_NOT_FOUND: &str = "JOB_NOT_FOUND";
    pub const LEDGER_UNAVAILABLE: &str = "LEDGER_UNAVAILABLE";

    // Object storage
    pub const UPLOAD_FAILED: &str = "UPLOAD_FAILED";
    pub const PRESIGN_FAILED: &str = "PRESIGN_FAILED";

    // System
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}

/// Standard error categories
pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const PROCESSING_ERROR: &str = "processing_error";
    pub const NOT_FOUND_ERROR: &str = "not_found_error";
    pub const STORAGE_ERROR: &str = "storage_error";
    pub const SERVER_ERROR: &str = "server_error";
    pub const SERVICE_UNAVAILABLE_ERROR: &str = "service_unavailable_error";
}
