//! HTTP client for the remote compose engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use vgen_models::VariationJobId;

use crate::error::{RenderError, RenderResult};

/// Compose engine configuration.
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    /// Engine base URL
    pub base_url: String,
    /// URL the engine calls back on completion
    pub callback_url: String,
    /// Bucket for rendered outputs
    pub output_bucket: String,
}

impl ComposeConfig {
    /// Create from environment variables.
    pub fn from_env() -> RenderResult<Self> {
        let base_url = std::env::var("COMPOSE_ENGINE_URL")
            .map_err(|_| RenderError::not_configured("COMPOSE_ENGINE_URL not set"))?;
        let callback_url = std::env::var("COMPOSE_CALLBACK_URL")
            .map_err(|_| RenderError::not_configured("COMPOSE_CALLBACK_URL not set"))?;
        let output_bucket =
            std::env::var("COMPOSE_OUTPUT_BUCKET").unwrap_or_else(|_| "vgen-renders".to_string());
        Ok(Self {
            base_url,
            callback_url,
            output_bucket,
        })
    }

    /// Output location for one job's render.
    pub fn output_key(&self, job_id: &VariationJobId) -> String {
        format!("variations/{}.mp4", job_id)
    }
}

/// One image slot in the slideshow, with its position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderImage {
    pub url: String,
    pub order: u32,
}

/// Audio track reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderAudio {
    pub url: String,
    pub start_time: f64,
    /// None lets the engine match the video duration
    pub duration: Option<f64>,
}

/// Subtitle script, reused verbatim from the seed when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderScript {
    pub lines: Vec<ScriptLinePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptLinePayload {
    pub text: String,
    pub timing: f64,
    pub duration: f64,
}

/// Style settings for one render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    pub vibe: String,
    pub effect_preset: String,
    pub aspect_ratio: String,
    pub target_duration: f64,
    pub text_style: String,
    pub color_grade: String,
}

/// Output storage location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutput {
    pub bucket: String,
    pub key: String,
}

/// Full submission payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    pub job_id: String,
    pub images: Vec<RenderImage>,
    pub audio: RenderAudio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<RenderScript>,
    pub settings: RenderSettings,
    pub output: RenderOutput,
    pub callback_url: String,
}

/// Engine acknowledgment of a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Opaque remote job handle
    pub call_id: String,
}

/// Engine status report, for the polling fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderStatusResponse {
    /// Engine-native status string
    pub status: String,
    /// Normalized status: completed, failed, or an in-progress value
    #[serde(rename = "mappedStatus")]
    pub mapped_status: String,
    #[serde(default)]
    pub output_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RenderStatusResponse {
    pub fn is_completed(&self) -> bool {
        self.mapped_status == "completed"
    }

    pub fn is_failed(&self) -> bool {
        self.mapped_status == "failed"
    }
}

/// Submission/status interface of the render engine. Split out so dispatch
/// and polling can be exercised without a live engine.
#[async_trait]
pub trait RenderSubmitter: Send + Sync {
    async fn submit(&self, request: &RenderRequest) -> RenderResult<SubmitResponse>;
    async fn status(&self, call_id: &str) -> RenderResult<RenderStatusResponse>;
}

/// Reqwest-backed compose engine client.
pub struct ComposeClient {
    http: reqwest::Client,
    base_url: String,
}

impl ComposeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &ComposeConfig) -> Self {
        Self::new(config.base_url.clone())
    }
}

#[async_trait]
impl RenderSubmitter for ComposeClient {
    async fn submit(&self, request: &RenderRequest) -> RenderResult<SubmitResponse> {
        debug!(job_id = %request.job_id, images = request.images.len(), "Submitting render");

        let response = self
            .http
            .post(format!("{}/render", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(job_id = %request.job_id, status = status.as_u16(), "Render submission rejected");
            return Err(RenderError::EngineStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SubmitResponse = response.json().await?;
        debug!(job_id = %request.job_id, call_id = %parsed.call_id, "Render accepted");
        Ok(parsed)
    }

    async fn status(&self, call_id: &str) -> RenderResult<RenderStatusResponse> {
        let response = self
            .http
            .get(format!("{}/render/{}/status", self.base_url, call_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::EngineStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
