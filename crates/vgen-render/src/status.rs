//! Convergent status updates: callback receiver and polling fallback.
//!
//! Both paths funnel into [`JobStore::apply_terminal`], so a job that is
//! already terminal absorbs duplicate and late reports as no-ops regardless
//! of which path delivered them first.

use std::time::Duration;

use metrics::counter;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{info, warn};

use vgen_models::VariationJobId;
use vgen_store::{Applied, JobStore, TerminalUpdate};

use crate::client::RenderSubmitter;
use crate::error::{RenderError, RenderResult};

/// Completion report posted by the render engine.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackPayload {
    pub job_id: String,
    /// Engine-native status string
    #[serde(default)]
    pub status: Option<String>,
    /// Normalized status: completed, failed, or an in-progress value
    #[serde(default, alias = "mappedStatus")]
    pub mapped_status: Option<String>,
    #[serde(default)]
    pub output_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CallbackPayload {
    /// Map the report to a terminal update, or None for in-progress noise.
    fn terminal_update(&self) -> Option<TerminalUpdate> {
        let mapped = self
            .mapped_status
            .as_deref()
            .or(self.status.as_deref())?
            .to_ascii_lowercase();
        match mapped.as_str() {
            "completed" => Some(TerminalUpdate::Completed {
                output_url: self.output_url.clone().unwrap_or_default(),
            }),
            "failed" => Some(TerminalUpdate::Failed {
                error: self
                    .error
                    .clone()
                    .unwrap_or_else(|| "Render failed".to_string()),
            }),
            _ => None,
        }
    }
}

/// Apply an engine callback to the job store.
///
/// Returns `None` when the payload carries no terminal status. Unknown job
/// ids come back as [`Applied::NotFound`]; the HTTP layer still acknowledges
/// those so the engine does not retry forever.
pub async fn apply_callback(
    store: &dyn JobStore,
    payload: &CallbackPayload,
) -> RenderResult<Option<Applied>> {
    let Some(update) = payload.terminal_update() else {
        info!(job_id = %payload.job_id, status = ?payload.mapped_status, "Ignoring non-terminal callback");
        return Ok(None);
    };

    let job_id = VariationJobId::from_string(payload.job_id.clone());
    let applied = store.apply_terminal(&job_id, update).await?;
    match applied {
        Applied::Updated => {
            counter!("vgen_callback_total", "outcome" => "applied").increment(1);
            info!(job_id = %job_id, "Callback applied");
        }
        Applied::AlreadyTerminal => {
            counter!("vgen_callback_total", "outcome" => "duplicate").increment(1);
            info!(job_id = %job_id, "Callback for already-terminal job ignored");
        }
        Applied::NotFound => {
            counter!("vgen_callback_total", "outcome" => "unknown").increment(1);
            warn!(job_id = %job_id, "Callback for unknown job");
        }
    }
    Ok(Some(applied))
}

/// Polling knobs. Defaults: every 3 seconds, give up after 5 minutes.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: Duration::from_secs(300),
        }
    }
}

impl PollerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |key: &str, fallback: Duration| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };
        Self {
            interval: read("RENDER_POLL_INTERVAL_SECS", defaults.interval),
            timeout: read("RENDER_POLL_TIMEOUT_SECS", defaults.timeout),
        }
    }
}

/// Poll the engine until the job reaches a terminal state or the deadline
/// passes. Local-dev fallback for environments the engine cannot call back
/// into; in deployment the callback usually wins the race and the next poll
/// becomes a no-op via the store's terminal guard.
///
/// Transient status-check errors are logged and retried until the deadline.
/// On timeout the job is failed with the elapsed budget recorded.
pub async fn poll_until_terminal(
    submitter: &dyn RenderSubmitter,
    store: &dyn JobStore,
    job_id: &VariationJobId,
    call_id: &str,
    config: PollerConfig,
) -> RenderResult<Applied> {
    let deadline = Instant::now() + config.timeout;

    loop {
        tokio::time::sleep(config.interval).await;

        if Instant::now() >= deadline {
            let message = RenderError::Timeout(config.timeout.as_secs()).to_string();
            warn!(job_id = %job_id, call_id, "{message}");
            return Ok(store
                .apply_terminal(job_id, TerminalUpdate::Failed { error: message })
                .await?);
        }

        let status = match submitter.status(call_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!(job_id = %job_id, call_id, error = %e, "Status check failed, retrying");
                continue;
            }
        };

        if status.is_completed() {
            let update = TerminalUpdate::Completed {
                output_url: status.output_url.unwrap_or_default(),
            };
            info!(job_id = %job_id, call_id, "Poll observed completion");
            return Ok(store.apply_terminal(job_id, update).await?);
        }
        if status.is_failed() {
            let update = TerminalUpdate::Failed {
                error: status
                    .error
                    .unwrap_or_else(|| "Render failed".to_string()),
            };
            info!(job_id = %job_id, call_id, "Poll observed failure");
            return Ok(store.apply_terminal(job_id, update).await?);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use vgen_models::{
        generate_combinations, AspectRatio, AxisSelection, BatchId, JobStatus, SeedGeneration,
        SeedStatus, VariationJob,
    };
    use vgen_store::MemoryJobStore;

    use crate::client::{RenderRequest, RenderStatusResponse, SubmitResponse};

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
            output_url: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    async fn processing_job(store: &MemoryJobStore) -> VariationJob {
        let combos = generate_combinations(&AxisSelection::default(), 1);
        let job = VariationJob::new_placeholder(&seed(), BatchId::new(), combos[0], "u");
        store.insert(&job).await.unwrap();
        store.mark_processing(&job.id, "call_1").await.unwrap();
        store.get(&job.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_completed_callback_applies() {
        let store = MemoryJobStore::new();
        let job = processing_job(&store).await;

        let payload = CallbackPayload {
            job_id: job.id.as_str().to_string(),
            status: Some("SUCCEEDED".into()),
            mapped_status: Some("completed".into()),
            output_url: Some("https://cdn.example/out.mp4".into()),
            error: None,
        };

        let applied = apply_callback(&store, &payload).await.unwrap();
        assert_eq!(applied, Some(Applied::Updated));

        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert_eq!(
            fetched.output_url.as_deref(),
            Some("https://cdn.example/out.mp4")
        );
        assert_eq!(fetched.progress, 100);
    }

    #[tokio::test]
    async fn test_duplicate_callback_is_noop() {
        let store = MemoryJobStore::new();
        let job = processing_job(&store).await;

        let payload = CallbackPayload {
            job_id: job.id.as_str().to_string(),
            status: None,
            mapped_status: Some("completed".into()),
            output_url: Some("https://cdn.example/first.mp4".into()),
            error: None,
        };
        assert_eq!(
            apply_callback(&store, &payload).await.unwrap(),
            Some(Applied::Updated)
        );

        let late = CallbackPayload {
            mapped_status: Some("failed".into()),
            error: Some("stale report".into()),
            output_url: None,
            ..payload
        };
        assert_eq!(
            apply_callback(&store, &late).await.unwrap(),
            Some(Applied::AlreadyTerminal)
        );

        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert_eq!(
            fetched.output_url.as_deref(),
            Some("https://cdn.example/first.mp4")
        );
    }

    #[tokio::test]
    async fn test_unknown_job_callback_is_acknowledged() {
        let store = MemoryJobStore::new();
        let payload = CallbackPayload {
            job_id: "var_missing".into(),
            status: None,
            mapped_status: Some("completed".into()),
            output_url: None,
            error: None,
        };
        assert_eq!(
            apply_callback(&store, &payload).await.unwrap(),
            Some(Applied::NotFound)
        );
    }

    #[tokio::test]
    async fn test_in_progress_callback_ignored() {
        let store = MemoryJobStore::new();
        let job = processing_job(&store).await;

        let payload = CallbackPayload {
            job_id: job.id.as_str().to_string(),
            status: Some("RUNNING".into()),
            mapped_status: Some("processing".into()),
            output_url: None,
            error: None,
        };
        assert_eq!(apply_callback(&store, &payload).await.unwrap(), None);
        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Processing);
    }

    /// Submitter whose status endpoint reports in-progress for the first
    /// `pending_polls` calls, then the final response.
    struct SequencedSubmitter {
        pending_polls: u32,
        calls: AtomicU32,
        terminal: RenderStatusResponse,
    }

    #[async_trait]
    impl RenderSubmitter for SequencedSubmitter {
        async fn submit(&self, _request: &RenderRequest) -> RenderResult<SubmitResponse> {
            unimplemented!("not used in poller tests")
        }

        async fn status(&self, _call_id: &str) -> RenderResult<RenderStatusResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.pending_polls {
                Ok(RenderStatusResponse {
                    status: "RUNNING".into(),
                    mapped_status: "processing".into(),
                    output_url: None,
                    error: None,
                })
            } else {
                Ok(self.terminal.clone())
            }
        }
    }

    #[tokio::test]
    async fn test_poll_until_completed() {
        let store = MemoryJobStore::new();
        let job = processing_job(&store).await;
        let submitter = SequencedSubmitter {
            pending_polls: 2,
            calls: AtomicU32::new(0),
            terminal: RenderStatusResponse {
                status: "SUCCEEDED".into(),
                mapped_status: "completed".into(),
                output_url: Some("https://cdn.example/out.mp4".into()),
                error: None,
            },
        };

        let config = PollerConfig {
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(10),
        };
        let applied = poll_until_terminal(&submitter, &store, &job.id, "call_1", config)
            .await
            .unwrap();
        assert_eq!(applied, Applied::Updated);

        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_timeout_fails_job() {
        let store = MemoryJobStore::new();
        let job = processing_job(&store).await;
        let submitter = SequencedSubmitter {
            pending_polls: u32::MAX,
            calls: AtomicU32::new(0),
            terminal: RenderStatusResponse {
                status: String::new(),
                mapped_status: String::new(),
                output_url: None,
                error: None,
            },
        };

        let config = PollerConfig {
            interval: Duration::from_millis(1),
            timeout: Duration::from_millis(10),
        };
        let applied = poll_until_terminal(&submitter, &store, &job.id, "call_1", config)
            .await
            .unwrap();
        assert_eq!(applied, Applied::Updated);

        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Failed);
        assert!(fetched
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("Render timed out after"));
    }

    #[tokio::test]
    async fn test_callback_beats_poller() {
        let store = Arc::new(MemoryJobStore::new());
        let job = processing_job(&store).await;

        let payload = CallbackPayload {
            job_id: job.id.as_str().to_string(),
            status: None,
            mapped_status: Some("completed".into()),
            output_url: Some("https://cdn.example/cb.mp4".into()),
            error: None,
        };
        apply_callback(store.as_ref(), &payload).await.unwrap();

        let submitter = SequencedSubmitter {
            pending_polls: 0,
            calls: AtomicU32::new(0),
            terminal: RenderStatusResponse {
                status: "FAILED".into(),
                mapped_status: "failed".into(),
                output_url: None,
                error: Some("late poll".into()),
            },
        };
        let config = PollerConfig {
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(10),
        };
        let applied = poll_until_terminal(&submitter, store.as_ref(), &job.id, "call_1", config)
            .await
            .unwrap();
        assert_eq!(applied, Applied::AlreadyTerminal);

        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert_eq!(fetched.output_url.as_deref(), Some("https://cdn.example/cb.mp4"));
    }
}
