//! Variation job placeholders tracked through the render pipeline.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::presets::{ColorGrade, EffectPreset, TextStyle, Vibe};
use crate::seed::{AspectRatio, AudioRef};

/// Namespaced identifier for a variation job.
///
/// The `var_` prefix marks the row as a variation so it can never collide
/// with seed generation ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VariationJobId(pub String);

impl VariationJobId {
    /// Generate a new namespaced id.
    pub fn new() -> Self {
        Self(format!("var_{}", Uuid::new_v4()))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VariationJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VariationJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Groups all jobs spawned from one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct BatchId(pub String);

impl BatchId {
    pub fn new() -> Self {
        Self(format!("batch_{}", Uuid::new_v4()))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Placeholder created, not yet submitted
    #[default]
    Pending,
    /// Submitted to the render engine
    Processing,
    /// Render finished, output URL recorded
    Completed,
    /// Submission or render failed
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One value per style axis; the unit of combinatorial generation.
///
/// No identity; compared structurally for deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct VariationSettings {
    pub effect_preset: EffectPreset,
    pub color_grade: ColorGrade,
    pub text_style: TextStyle,
    pub vibe: Vibe,
}

impl VariationSettings {
    /// Human-readable label shown in the comparison view.
    pub fn label(&self) -> String {
        format!(
            "{} - {}/{}",
            self.vibe, self.effect_preset, self.color_grade
        )
    }
}

/// Directive to publish a completed variation automatically.
///
/// Stored with the job and honored by the external publish collaborator
/// once the job reaches `Completed`; the variation core only carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AutoPublish {
    pub social_account_id: String,
    /// Minutes between scheduled posts within the batch
    pub interval_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// A persisted placeholder for one styled re-render of a seed.
///
/// Created once per combination at request time. Mutated by the dispatcher
/// (Pending -> Processing, remote handle set) and by the status
/// poller/callback receiver (-> Completed/Failed). Never deleted; the
/// lifecycle ends at a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VariationJob {
    pub id: VariationJobId,

    /// Seed this variation was spawned from
    pub seed_id: String,

    pub batch_id: BatchId,

    /// Human-readable label, e.g. "Pop - zoom_beat/vibrant"
    pub variation_label: String,

    #[serde(default)]
    pub status: JobStatus,

    /// Progress (0-100)
    #[serde(default)]
    pub progress: u8,

    pub settings: VariationSettings,

    /// Inherited from the seed
    pub duration: f64,

    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioRef>,

    /// Opaque handle assigned by the render engine after submission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_handle: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,

    /// Set only when status is Failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_publish: Option<AutoPublish>,

    /// User that requested the batch
    pub requested_by: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl VariationJob {
    /// Create a pending placeholder for one combination.
    pub fn new_placeholder(
        seed: &crate::seed::SeedGeneration,
        batch_id: BatchId,
        settings: VariationSettings,
        requested_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: VariationJobId::new(),
            seed_id: seed.id.clone(),
            batch_id,
            variation_label: settings.label(),
            status: JobStatus::Pending,
            progress: 0,
            settings,
            duration: seed.duration,
            aspect_ratio: seed.aspect_ratio,
            audio: seed.audio.clone(),
            remote_handle: None,
            output_url: None,
            error_message: None,
            auto_publish: None,
            requested_by: requested_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach an auto-publish directive.
    pub fn with_auto_publish(mut self, auto_publish: Option<AutoPublish>) -> Self {
        self.auto_publish = auto_publish;
        self
    }

    /// Record successful submission to the render engine.
    pub fn start(mut self, remote_handle: impl Into<String>) -> Self {
        self.status = JobStatus::Processing;
        self.remote_handle = Some(remote_handle.into());
        self.updated_at = Utc::now();
        self
    }

    /// Mark the render as completed.
    pub fn complete(mut self, output_url: impl Into<String>) -> Self {
        self.status = JobStatus::Completed;
        self.output_url = Some(output_url.into());
        self.progress = 100;
        self.updated_at = Utc::now();
        self
    }

    /// Mark the job as failed with the captured error message.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = JobStatus::Failed;
        self.error_message = Some(error.into());
        self.progress = 100;
        self.updated_at = Utc::now();
        self
    }
}
