//! In-memory stores for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use vgen_models::{BatchId, SeedGeneration, VariationJob, VariationJobId};

use crate::error::StoreResult;
use crate::job_store::{apply_update, Applied, JobStore, TerminalUpdate};
use crate::seed_store::SeedStore;

/// HashMap-backed job store.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, VariationJob>>,
    /// Batch id -> job ids in insertion order
    batches: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: &VariationJob) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        let mut batches = self.batches.write().await;
        jobs.insert(job.id.as_str().to_string(), job.clone());
        batches
            .entry(job.batch_id.as_str().to_string())
            .or_default()
            .push(job.id.as_str().to_string());
        Ok(())
    }

    async fn get(&self, id: &VariationJobId) -> StoreResult<Option<VariationJob>> {
        Ok(self.jobs.read().await.get(id.as_str()).cloned())
    }

    async fn list_batch(&self, batch_id: &BatchId) -> StoreResult<Vec<VariationJob>> {
        let jobs = self.jobs.read().await;
        let batches = self.batches.read().await;
        Ok(batches
            .get(batch_id.as_str())
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| jobs.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn mark_processing(
        &self,
        id: &VariationJobId,
        remote_handle: &str,
    ) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.remove(id.as_str()) {
            jobs.insert(id.as_str().to_string(), job.start(remote_handle));
        }
        Ok(())
    }

    async fn apply_terminal(
        &self,
        id: &VariationJobId,
        update: TerminalUpdate,
    ) -> StoreResult<Applied> {
        let mut jobs = self.jobs.write().await;
        match jobs.remove(id.as_str()) {
            Some(job) => {
                let (job, applied) = apply_update(job, update);
                jobs.insert(id.as_str().to_string(), job);
                Ok(applied)
            }
            None => Ok(Applied::NotFound),
        }
    }
}

/// HashMap-backed seed store.
#[derive(Default)]
pub struct MemorySeedStore {
    seeds: RwLock<HashMap<String, SeedGeneration>>,
}

impl MemorySeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, seed: SeedGeneration) {
        self.seeds.write().await.insert(seed.id.clone(), seed);
    }
}

#[async_trait]
impl SeedStore for MemorySeedStore {
    async fn get(&self, seed_id: &str) -> StoreResult<Option<SeedGeneration>> {
        Ok(self.seeds.read().await.get(seed_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vgen_models::{
        AspectRatio, ColorGrade, EffectPreset, JobStatus, SeedStatus, TextStyle,
        VariationSettings, Vibe,
    };

    fn seed() -> SeedGeneration {
        SeedGeneration {
            id: "seed_1".into(),
            label_id: "label_1".into(),
            prompt: "p".into(),
            negative_prompt: None,
            duration: 15.0,
            aspect_ratio: AspectRatio::PORTRAIT,
            audio: None,
            status: SeedStatus::Completed,
            output_url: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    fn settings() -> VariationSettings {
        VariationSettings {
            effect_preset: EffectPreset::ZoomBeat,
            color_grade: ColorGrade::Vibrant,
            text_style: TextStyle::BoldPop,
            vibe: Vibe::Pop,
        }
    }

    #[tokio::test]
    async fn test_insert_get_roundtrip() {
        let store = MemoryJobStore::new();
        let job = VariationJob::new_placeholder(&seed(), BatchId::new(), settings(), "u");
        store.insert(&job).await.unwrap();

        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, job.id);
        assert_eq!(fetched.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_batch_preserves_creation_order() {
        let store = MemoryJobStore::new();
        let batch = BatchId::new();
        let mut ids = Vec::new();
        for _ in 0..4 {
            let job = VariationJob::new_placeholder(&seed(), batch.clone(), settings(), "u");
            ids.push(job.id.clone());
            store.insert(&job).await.unwrap();
        }

        let listed = store.list_batch(&batch).await.unwrap();
        let listed_ids: Vec<_> = listed.iter().map(|j| j.id.clone()).collect();
        assert_eq!(listed_ids, ids);
    }

    #[tokio::test]
    async fn test_mark_processing_sets_handle() {
        let store = MemoryJobStore::new();
        let job = VariationJob::new_placeholder(&seed(), BatchId::new(), settings(), "u");
        store.insert(&job).await.unwrap();

        store.mark_processing(&job.id, "call_1").await.unwrap();
        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Processing);
        assert_eq!(fetched.remote_handle.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn test_terminal_not_found_is_noop() {
        let store = MemoryJobStore::new();
        let applied = store
            .apply_terminal(
                &VariationJobId::from_string("var_missing"),
                TerminalUpdate::Failed {
                    error: "late".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(applied, Applied::NotFound);
    }

    #[tokio::test]
    async fn test_double_completion_is_noop() {
        let store = MemoryJobStore::new();
        let job = VariationJob::new_placeholder(&seed(), BatchId::new(), settings(), "u");
        store.insert(&job).await.unwrap();
        store.mark_processing(&job.id, "call_1").await.unwrap();

        let update = TerminalUpdate::Completed {
            output_url: "https://cdn.example/a.mp4".into(),
        };
        assert_eq!(
            store.apply_terminal(&job.id, update.clone()).await.unwrap(),
            Applied::Updated
        );
        assert_eq!(
            store.apply_terminal(&job.id, update).await.unwrap(),
            Applied::AlreadyTerminal
        );

        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.output_url.as_deref(), Some("https://cdn.example/a.mp4"));
    }
}
