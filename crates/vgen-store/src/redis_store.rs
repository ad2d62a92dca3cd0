//! Redis-backed stores.
//!
//! Jobs are JSON values under `vgen:job:{id}`; batch membership is a list
//! under `vgen:batch:{batch_id}` preserving creation order. Updates are
//! single-key writes; the terminal idempotency rule is enforced by
//! read-apply-write rather than row locking, per the shared-resource policy
//! (same-key concurrent terminal writes carry equal outcomes).

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use vgen_models::{BatchId, SeedGeneration, VariationJob, VariationJobId};

use crate::error::{StoreError, StoreResult};
use crate::job_store::{apply_update, Applied, JobStore, TerminalUpdate};
use crate::seed_store::SeedStore;

fn job_key(id: &VariationJobId) -> String {
    format!("vgen:job:{}", id)
}

fn batch_list_key(batch_id: &BatchId) -> String {
    format!("vgen:batch:{}", batch_id)
}

fn seed_key(seed_id: &str) -> String {
    format!("vgen:seed:{}", seed_id)
}

/// Redis job store.
pub struct RedisJobStore {
    client: redis::Client,
}

impl RedisJobStore {
    pub fn new(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> StoreResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&url)
    }

    async fn read_job(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        id: &VariationJobId,
    ) -> StoreResult<Option<VariationJob>> {
        let raw: Option<String> = conn.get(job_key(id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn write_job(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        job: &VariationJob,
    ) -> StoreResult<()> {
        let json = serde_json::to_string(job)?;
        conn.set::<_, _, ()>(job_key(&job.id), json).await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn insert(&self, job: &VariationJob) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        self.write_job(&mut conn, job).await?;
        conn.rpush::<_, _, ()>(batch_list_key(&job.batch_id), job.id.as_str())
            .await?;
        debug!(job_id = %job.id, batch_id = %job.batch_id, "Inserted variation job");
        Ok(())
    }

    async fn get(&self, id: &VariationJobId) -> StoreResult<Option<VariationJob>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        self.read_job(&mut conn, id).await
    }

    async fn list_batch(&self, batch_id: &BatchId) -> StoreResult<Vec<VariationJob>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ids: Vec<String> = conn.lrange(batch_list_key(batch_id), 0, -1).await?;
        let mut jobs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(job) = self
                .read_job(&mut conn, &VariationJobId::from_string(id))
                .await?
            {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    async fn mark_processing(
        &self,
        id: &VariationJobId,
        remote_handle: &str,
    ) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let job = self
            .read_job(&mut conn, id)
            .await?
            .ok_or_else(|| StoreError::not_found(id.as_str()))?;
        self.write_job(&mut conn, &job.start(remote_handle)).await
    }

    async fn apply_terminal(
        &self,
        id: &VariationJobId,
        update: TerminalUpdate,
    ) -> StoreResult<Applied> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        match self.read_job(&mut conn, id).await? {
            Some(job) => {
                let (job, applied) = apply_update(job, update);
                if applied == Applied::Updated {
                    self.write_job(&mut conn, &job).await?;
                    debug!(job_id = %id, status = %job.status, "Applied terminal update");
                }
                Ok(applied)
            }
            None => Ok(Applied::NotFound),
        }
    }
}

/// Redis seed store.
pub struct RedisSeedStore {
    client: redis::Client,
}

impl RedisSeedStore {
    pub fn new(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    pub fn from_env() -> StoreResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&url)
    }

    /// Write a seed row; used by the generation pipeline and seeding tools.
    pub async fn insert(&self, seed: &SeedGeneration) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(seed)?;
        conn.set::<_, _, ()>(seed_key(&seed.id), json).await?;
        Ok(())
    }
}

#[async_trait]
impl SeedStore for RedisSeedStore {
    async fn get(&self, seed_id: &str) -> StoreResult<Option<SeedGeneration>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(seed_key(seed_id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
