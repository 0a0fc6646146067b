//! In-process job ledger with lazy TTL expiry, for tests and single-node runs.

use super::{checkpoint, JobError, JobId, JobLedger, JobResult};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
struct Entry {
    progress: u8,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct InMemoryJobLedger {
    entries: Arc<DashMap<JobId, Entry>>,
    ttl: Duration,
}

impl Default for InMemoryJobLedger {
    fn default() -> Self {
        Self::new(Duration::from_secs(super::DEFAULT_JOB_TTL_SECS))
    }
}

impl InMemoryJobLedger {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Number of live (unexpired) jobs.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self, id: &JobId, progress: u8) {
        self.entries.insert(
            id.clone(),
            Entry {
                progress,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

#[async_trait::async_trait]
impl JobLedger for InMemoryJobLedger {
    async fn create_job(&self, id: &JobId) -> JobResult<()> {
        self.write(id, checkpoint::CREATED);
        Ok(())
    }

    async fn set_progress(&self, id: &JobId, progress: u8) -> JobResult<()> {
        self.write(id, progress);
        Ok(())
    }

    async fn get_progress(&self, id: &JobId) -> JobResult<u8> {
        // copy out so the shard guard is released before a possible remove
        let entry = self.entries.get(id).map(|e| *e);

        match entry {
            Some(entry) if entry.expires_at > Instant::now() => Ok(entry.progress),
            Some(_) => {
                self.entries
                    .remove_if(id, |_, e| e.expires_at <= Instant::now());
                Err(JobError::NotFound(id.clone()))
            }
            None => Err(JobError::NotFound(id.clone())),
        }
    }

    async fn ping(&self) -> JobResult<()> {
        Ok(())
    }
}
