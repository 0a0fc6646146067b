//! Job ledger
//!
//! Tracks a 0..=100 progress value per job id. Entries expire after a TTL
//! that is refreshed on every write. Ledger writes from the pipelines are
//! best-effort: a failed write is logged and never fails the request.

mod memory;
mod redis_ledger;

pub use self::memory::InMemoryJobLedger;
pub use self::redis_ledger::RedisJobLedger;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Default time-to-live of a ledger entry (30 minutes)
pub const DEFAULT_JOB_TTL_SECS: u64 = 1800;

/// Progress values written by the pipelines, in the order they are reached.
pub mod checkpoint {
    pub const CREATED: u8 = 0;
    pub const STARTED: u8 = 5;
    pub const FORM_PARSED: u8 = 10;
    pub const INPUT_RECEIVED: u8 = 20;
    pub const INPUT_READ: u8 = 30;
    pub const ENCODED: u8 = 60;
    pub const UPLOADED: u8 = 80;
    pub const COMPLETE: u8 = 100;
}

/// Opaque job identifier. Generated ids are UUIDv7, so they embed their creation time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Job not found: {0}")]
    NotFound(JobId),
}

pub type JobResult<T> = Result<T, JobError>;

#[async_trait::async_trait]
pub trait JobLedger: Send + Sync {
    /// Register `id` with progress 0.
    async fn create_job(&self, id: &JobId) -> JobResult<()>;

    /// Overwrite the progress of `id` and refresh its TTL.
    async fn set_progress(&self, id: &JobId, progress: u8) -> JobResult<()>;

    /// Current progress of `id`; `NotFound` if it was never created or has expired.
    async fn get_progress(&self, id: &JobId) -> JobResult<u8>;

    async fn complete_job(&self, id: &JobId) -> JobResult<()> {
        self.set_progress(id, checkpoint::COMPLETE).await
    }

    /// Backend reachability, used by the readiness probe.
    async fn ping(&self) -> JobResult<()>;
}

/// Write a checkpoint, logging instead of failing when the ledger is unavailable.
pub async fn record_progress(ledger: &dyn JobLedger, id: &JobId, progress: u8) {
    if let Err(e) = ledger.set_progress(id, progress).await {
        warn!(job_id = %id, progress, error = %e, "Failed to record job progress");
    }
}

/// Complete a job, logging instead of failing when the ledger is unavailable.
pub async fn record_complete(ledger: &dyn JobLedger, id: &JobId) {
    if let Err(e) = ledger.complete_job(id).await {
        warn!(job_id = %id, error = %e, "Failed to mark job complete");
    }
}

/// Parent progress after `done` of `total` batch items, rounded down.
pub fn batch_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return checkpoint::CREATED;
    }
    (100 * done.min(total) / total) as u8
}
