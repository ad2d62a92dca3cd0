//! Variation job factory: one persisted placeholder per combination.

use tracing::{info, warn};

use vgen_models::{
    AutoPublish, BatchId, JobStatus, SeedGeneration, VariationJob, VariationSettings,
};
use vgen_store::JobStore;

use crate::error::RenderResult;

/// Create one pending placeholder per combination, all sharing a fresh
/// batch id.
///
/// Combinations are independent: a persistence failure for one surfaces
/// that job as failed in the returned list and the rest continue.
pub async fn create_jobs(
    store: &dyn JobStore,
    seed: &SeedGeneration,
    combinations: &[VariationSettings],
    requested_by: &str,
    auto_publish: Option<AutoPublish>,
) -> RenderResult<(BatchId, Vec<VariationJob>)> {
    let batch_id = BatchId::new();
    let mut jobs = Vec::with_capacity(combinations.len());

    for settings in combinations {
        let job = VariationJob::new_placeholder(seed, batch_id.clone(), *settings, requested_by)
            .with_auto_publish(auto_publish.clone());

        match store.insert(&job).await {
            Ok(()) => jobs.push(job),
            Err(e) => {
                warn!(
                    job_id = %job.id,
                    batch_id = %batch_id,
                    error = %e,
                    "Failed to persist placeholder, surfacing job as failed"
                );
                jobs.push(job.fail(format!("Failed to persist job: {}", e)));
            }
        }
    }

    info!(
        batch_id = %batch_id,
        seed_id = %seed.id,
        count = jobs.len(),
        "Created variation batch"
    );

    debug_assert!(jobs
        .iter()
        .all(|j| j.status == JobStatus::Pending || j.status == JobStatus::Failed));

    Ok((batch_id, jobs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vgen_models::{
        generate_combinations, AspectRatio, AxisSelection, EffectPreset, SeedStatus, Vibe,
    };
    use vgen_store::MemoryJobStore;

    fn seed() -> SeedGeneration {
        SeedGeneration {
            id: "seed_1".into(),
            label_id: "label_1".into(),
            prompt: "city lights".into(),
            negative_prompt: None,
            duration: 15.0,
            aspect_ratio: AspectRatio::PORTRAIT,
            audio: None,
            status: SeedStatus::Completed,
            output_url: Some("https://cdn.example/seed.mp4".into()),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_four_jobs_share_one_batch() {
        let store = MemoryJobStore::new();
        let axes = AxisSelection {
            effects: vec![EffectPreset::ZoomBeat, EffectPreset::Crossfade],
            vibes: vec![Vibe::Pop, Vibe::Hype],
            ..AxisSelection::default()
        };
        let combos = generate_combinations(&axes, 4);

        let (batch_id, jobs) = create_jobs(&store, &seed(), &combos, "user_1", None)
            .await
            .unwrap();

        assert_eq!(jobs.len(), 4);
        for job in &jobs {
            assert_eq!(job.batch_id, batch_id);
            assert_eq!(job.status, JobStatus::Pending);
            assert_eq!(job.duration, 15.0);
            assert_eq!(job.aspect_ratio, AspectRatio::PORTRAIT);
        }

        // All four distinct {effect, vibe} pairs present
        let mut pairs: Vec<_> = jobs
            .iter()
            .map(|j| (j.settings.effect_preset, j.settings.vibe))
            .collect();
        pairs.sort_by_key(|(e, v)| (e.as_str(), v.as_str()));
        pairs.dedup();
        assert_eq!(pairs.len(), 4);

        // Persisted in creation order
        let listed = store.list_batch(&batch_id).await.unwrap();
        assert_eq!(listed.len(), 4);
    }

    #[tokio::test]
    async fn test_auto_publish_carried_on_every_job() {
        let store = MemoryJobStore::new();
        let combos = generate_combinations(&AxisSelection::default(), 9);
        let directive = AutoPublish {
            social_account_id: "acct_1".into(),
            interval_minutes: 60,
            caption: Some("new drop".into()),
            hashtags: vec!["fyp".into()],
        };

        let (_, jobs) = create_jobs(&store, &seed(), &combos, "user_1", Some(directive))
            .await
            .unwrap();

        for job in &jobs {
            let ap = job.auto_publish.as_ref().unwrap();
            assert_eq!(ap.social_account_id, "acct_1");
        }
    }

    #[tokio::test]
    async fn test_labels_are_human_readable() {
        let store = MemoryJobStore::new();
        let combos = generate_combinations(&AxisSelection::default(), 1);
        let (_, jobs) = create_jobs(&store, &seed(), &combos, "u", None).await.unwrap();
        assert_eq!(jobs[0].variation_label, "Pop - zoom_beat/vibrant");
    }
}
