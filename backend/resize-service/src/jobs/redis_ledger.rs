//! Redis-backed job ledger: one `job:{id}:progress` integer key per job,
//! written with `SETEX` so every update refreshes the TTL.

use super::{checkpoint, JobError, JobId, JobLedger, JobResult};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Shared Redis connection manager
pub type SharedRedis = Arc<Mutex<ConnectionManager>>;

#[derive(Clone)]
pub struct RedisJobLedger {
    redis: SharedRedis,
    ttl_secs: u64,
}

impl RedisJobLedger {
    pub async fn connect(redis_url: &str, ttl_secs: u64) -> JobResult<Self> {
        let client = Client::open(redis_url).map_err(unavailable)?;
        let manager = ConnectionManager::new(client).await.map_err(unavailable)?;
        Ok(Self::new(Arc::new(Mutex::new(manager)), ttl_secs))
    }

    pub fn new(redis: SharedRedis, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }
}

pub(crate) fn progress_key(id: &JobId) -> String {
    format!("job:{}:progress", id)
}

fn unavailable(e: redis::RedisError) -> JobError {
    JobError::LedgerUnavailable(e.to_string())
}

#[async_trait::async_trait]
impl JobLedger for RedisJobLedger {
    async fn create_job(&self, id: &JobId) -> JobResult<()> {
        self.set_progress(id, checkpoint::CREATED).await?;
        debug!(job_id = %id, ttl = self.ttl_secs, "Job created");
        Ok(())
    }

    async fn set_progress(&self, id: &JobId, progress: u8) -> JobResult<()> {
        let key = progress_key(id);
        let mut conn = self.redis.lock().await;
        conn.set_ex::<_, _, ()>(&key, i64::from(progress), self.ttl_secs)
            .await
            .map_err(unavailable)?;

        debug!(job_id = %id, progress, "Job progress updated");
        Ok(())
    }

    async fn get_progress(&self, id: &JobId) -> JobResult<u8> {
        let key = progress_key(id);
        let mut conn = self.redis.lock().await;
        let value: Option<i64> = conn.get(&key).await.map_err(unavailable)?;

        match value {
            Some(progress) => Ok(progress.clamp(0, i64::from(u8::MAX)) as u8),
            None => Err(JobError::NotFound(id.clone())),
        }
    }

    async fn ping(&self) -> JobResult<()> {
        let mut conn = self.redis.lock().await;
        redis::cmd("PING")
            .query_async::<_, String>(&mut *conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_key_layout() {
        let id = JobId::from("0190c1de-7c4e-7000-8000-000000000001");
        assert_eq!(
            progress_key(&id),
            "job:0190c1de-7c4e-7000-8000-000000000001:progress"
        );
    }
}
