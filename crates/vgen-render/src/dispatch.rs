//! Fire-and-continue render dispatch.

use std::sync::Arc;

use futures::future::join_all;
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use vgen_models::{AudioRef, ScriptLine, VariationJob};
use vgen_store::{JobStore, TerminalUpdate};

use crate::client::{
    ComposeConfig, RenderAudio, RenderImage, RenderOutput, RenderRequest, RenderScript,
    RenderSettings, RenderSubmitter, ScriptLinePayload,
};

/// Assets shared by every job in a batch: the image set sourced once, the
/// seed's script lines (reused verbatim so subtitles stay consistent across
/// variations), and the audio reference.
#[derive(Debug, Clone, Default)]
pub struct SharedAssets {
    /// Ordered image URLs
    pub image_urls: Vec<String>,
    pub script_lines: Option<Vec<ScriptLine>>,
    pub audio: Option<AudioRef>,
}

/// Outcome of one dispatch attempt. Failures are captured into the job row,
/// never propagated to the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Submitted; carries the remote handle
    Submitted(String),
    /// Submission failed; carries the recorded error message
    Failed(String),
}

/// Build the render request for one job.
fn build_request(
    config: &ComposeConfig,
    job: &VariationJob,
    shared: &SharedAssets,
) -> Result<RenderRequest, String> {
    let audio = shared
        .audio
        .as_ref()
        .or(job.audio.as_ref())
        .ok_or_else(|| "Seed has no audio reference".to_string())?;

    if shared.image_urls.is_empty() {
        return Err("No images available for render".to_string());
    }

    let images = shared
        .image_urls
        .iter()
        .enumerate()
        .map(|(order, url)| RenderImage {
            url: url.clone(),
            order: order as u32,
        })
        .collect();

    let script = shared.script_lines.as_ref().map(|lines| RenderScript {
        lines: lines
            .iter()
            .map(|l| ScriptLinePayload {
                text: l.text.clone(),
                timing: l.timing,
                duration: l.duration,
            })
            .collect(),
    });

    Ok(RenderRequest {
        job_id: job.id.as_str().to_string(),
        images,
        audio: RenderAudio {
            url: audio.url.clone(),
            start_time: audio.start_time,
            duration: audio.duration,
        },
        script,
        settings: RenderSettings {
            vibe: job.settings.vibe.to_string(),
            effect_preset: job.settings.effect_preset.to_string(),
            aspect_ratio: job.aspect_ratio.to_string(),
            target_duration: job.duration,
            text_style: job.settings.text_style.to_string(),
            color_grade: job.settings.color_grade.to_string(),
        },
        output: RenderOutput {
            bucket: config.output_bucket.clone(),
            key: config.output_key(&job.id),
        },
        callback_url: config.callback_url.clone(),
    })
}

/// Submit one job to the render engine.
///
/// On success the job transitions Pending -> Processing with the remote
/// handle recorded. On any failure (request build, network, non-2xx) the job
/// transitions to Failed with the message captured verbatim. No automatic
/// retry: the engine is the expensive, rate-limited resource, so re-triggers
/// are a manual action.
pub async fn dispatch_job(
    submitter: &dyn RenderSubmitter,
    store: &dyn JobStore,
    config: &ComposeConfig,
    job: &VariationJob,
    shared: &SharedAssets,
) -> DispatchOutcome {
    let request = match build_request(config, job, shared) {
        Ok(request) => request,
        Err(message) => {
            return record_failure(store, job, message).await;
        }
    };

    match submitter.submit(&request).await {
        Ok(response) => {
            counter!("vgen_dispatch_total", "outcome" => "submitted").increment(1);
            if let Err(e) = store.mark_processing(&job.id, &response.call_id).await {
                warn!(job_id = %job.id, error = %e, "Failed to record remote handle");
            }
            info!(job_id = %job.id, call_id = %response.call_id, "Render dispatched");
            DispatchOutcome::Submitted(response.call_id)
        }
        Err(e) => record_failure(store, job, e.to_string()).await,
    }
}

async fn record_failure(
    store: &dyn JobStore,
    job: &VariationJob,
    message: String,
) -> DispatchOutcome {
    counter!("vgen_dispatch_total", "outcome" => "failed").increment(1);
    warn!(job_id = %job.id, error = %message, "Render dispatch failed");
    if let Err(e) = store
        .apply_terminal(
            &job.id,
            TerminalUpdate::Failed {
                error: message.clone(),
            },
        )
        .await
    {
        warn!(job_id = %job.id, error = %e, "Failed to record dispatch failure");
    }
    DispatchOutcome::Failed(message)
}

/// Dispatch every job in a batch independently and concurrently.
///
/// All submissions start without waiting for each other; one failing never
/// blocks or cancels siblings. Handles are returned so callers can await
/// completion in tests, but dropping them is fine in the fire-and-continue
/// path.
pub fn dispatch_all(
    submitter: Arc<dyn RenderSubmitter>,
    store: Arc<dyn JobStore>,
    config: Arc<ComposeConfig>,
    jobs: Vec<VariationJob>,
    shared: Arc<SharedAssets>,
) -> Vec<JoinHandle<DispatchOutcome>> {
    jobs.into_iter()
        .map(|job| {
            let submitter = Arc::clone(&submitter);
            let store = Arc::clone(&store);
            let config = Arc::clone(&config);
            let shared = Arc::clone(&shared);
            tokio::spawn(async move {
                dispatch_job(submitter.as_ref(), store.as_ref(), &config, &job, &shared).await
            })
        })
        .collect()
}

/// Run an async operation over a work list with bounded concurrency: the
/// list is sliced into chunks of `cap` and each chunk completes fully before
/// the next starts. Used by the image-generation path to cap simultaneous
/// in-flight remote jobs.
pub async fn for_each_chunked<T, F, Fut>(items: Vec<T>, cap: usize, f: F)
where
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let cap = cap.max(1);
    let mut items = items;
    while !items.is_empty() {
        let take = cap.min(items.len());
        let chunk: Vec<T> = items.drain(..take).collect();
        join_all(chunk.into_iter().map(&f)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use vgen_models::{
        generate_combinations, AspectRatio, AxisSelection, BatchId, JobStatus, SeedGeneration,
        SeedStatus,
    };
    use vgen_store::MemoryJobStore;

    use crate::client::{RenderStatusResponse, SubmitResponse};
    use crate::error::{RenderError, RenderResult};

    fn seed() -> SeedGeneration {
        SeedGeneration {
            id: "seed_1".into(),
            label_id: "label_1".into(),
            prompt: "city lights".into(),
            negative_prompt: None,
            duration: 15.0,
            aspect_ratio: AspectRatio::PORTRAIT,
            audio: Some(AudioRef {
                url: "https://cdn.example/track.mp3".into(),
                start_time: 2.0,
                duration: None,
            }),
            status: SeedStatus::Completed,
            output_url: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    fn shared() -> SharedAssets {
        SharedAssets {
            image_urls: vec![
                "https://img.example/a.jpg".to_string(),
                "https://img.example/b.jpg".to_string(),
            ],
            script_lines: Some(vec![ScriptLine {
                text: "hello".into(),
                timing: 0.0,
                duration: 2.0,
            }]),
            audio: None,
        }
    }

    fn config() -> ComposeConfig {
        ComposeConfig {
            base_url: "http://engine".into(),
            callback_url: "http://api/api/render/callback".into(),
            output_bucket: "vgen-renders".into(),
        }
    }

    async fn jobs(store: &MemoryJobStore, count: usize) -> Vec<VariationJob> {
        let axes = AxisSelection {
            effects: vec![
                vgen_models::EffectPreset::ZoomBeat,
                vgen_models::EffectPreset::Crossfade,
            ],
            vibes: vec![vgen_models::Vibe::Pop, vgen_models::Vibe::Hype],
            ..AxisSelection::default()
        };
        let combos = generate_combinations(&axes, count);
        let batch = BatchId::new();
        let mut out = Vec::new();
        for settings in combos.into_iter().take(count) {
            let job = VariationJob::new_placeholder(&seed(), batch.clone(), settings, "u");
            store.insert(&job).await.unwrap();
            out.push(job);
        }
        out
    }

    /// Submitter that fails for job ids listed in `fail_for`.
    struct StubSubmitter {
        fail_for: Vec<String>,
        submissions: AtomicU32,
    }

    impl StubSubmitter {
        fn new(fail_for: Vec<String>) -> Self {
            Self {
                fail_for,
                submissions: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl RenderSubmitter for StubSubmitter {
        async fn submit(&self, request: &RenderRequest) -> RenderResult<SubmitResponse> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            if self.fail_for.contains(&request.job_id) {
                return Err(RenderError::submit_failed("connection reset by peer"));
            }
            Ok(SubmitResponse {
                call_id: format!("call_{}", request.job_id),
            })
        }

        async fn status(&self, _call_id: &str) -> RenderResult<RenderStatusResponse> {
            unimplemented!("not used in dispatch tests")
        }
    }

    #[test]
    fn test_build_request_shapes() {
        let combos = generate_combinations(&AxisSelection::default(), 1);
        let job = VariationJob::new_placeholder(&seed(), BatchId::new(), combos[0], "u");

        let request = build_request(&config(), &job, &shared()).unwrap();
        assert_eq!(request.images.len(), 2);
        assert_eq!(request.images[1].order, 1);
        assert_eq!(request.audio.url, "https://cdn.example/track.mp3");
        assert_eq!(request.audio.start_time, 2.0);
        assert_eq!(request.settings.aspect_ratio, "9:16");
        assert_eq!(request.settings.target_duration, 15.0);
        assert!(request.script.is_some());
        assert_eq!(request.output.key, format!("variations/{}.mp4", job.id));
    }

    #[test]
    fn test_build_request_requires_images() {
        let combos = generate_combinations(&AxisSelection::default(), 1);
        let job = VariationJob::new_placeholder(&seed(), BatchId::new(), combos[0], "u");
        let empty = SharedAssets {
            image_urls: vec![],
            ..shared()
        };
        assert!(build_request(&config(), &job, &empty).is_err());
    }

    #[tokio::test]
    async fn test_dispatch_success_marks_processing() {
        let store = MemoryJobStore::new();
        let job = jobs(&store, 1).await.remove(0);
        let submitter = StubSubmitter::new(vec![]);

        let outcome = dispatch_job(&submitter, &store, &config(), &job, &shared()).await;
        assert!(matches!(outcome, DispatchOutcome::Submitted(_)));

        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Processing);
        assert!(fetched.remote_handle.is_some());
    }

    #[tokio::test]
    async fn test_one_failure_leaves_siblings_independent() {
        let store = Arc::new(MemoryJobStore::new());
        let batch = jobs(&store, 4).await;
        let failing_id = batch[2].id.as_str().to_string();
        let submitter = Arc::new(StubSubmitter::new(vec![failing_id.clone()]));

        let handles = dispatch_all(
            submitter.clone() as Arc<dyn RenderSubmitter>,
            store.clone() as Arc<dyn JobStore>,
            Arc::new(config()),
            batch.clone(),
            Arc::new(shared()),
        );
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(submitter.submissions.load(Ordering::SeqCst), 4);

        for (index, job) in batch.iter().enumerate() {
            let fetched = store.get(&job.id).await.unwrap().unwrap();
            if index == 2 {
                assert_eq!(fetched.status, JobStatus::Failed);
                assert_eq!(
                    fetched.error_message.as_deref(),
                    Some("Submission failed: connection reset by peer")
                );
            } else {
                assert_eq!(fetched.status, JobStatus::Processing);
            }
        }
    }

    #[tokio::test]
    async fn test_for_each_chunked_caps_concurrency() {
        use std::sync::atomic::AtomicI32;

        let in_flight = Arc::new(AtomicI32::new(0));
        let peak = Arc::new(AtomicI32::new(0));

        let items: Vec<u32> = (0..10).collect();
        let in_flight_ref = Arc::clone(&in_flight);
        let peak_ref = Arc::clone(&peak);

        for_each_chunked(items, 3, move |_| {
            let in_flight = Arc::clone(&in_flight_ref);
            let peak = Arc::clone(&peak_ref);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
