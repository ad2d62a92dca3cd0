//! Session stages, variation view-models, and the approval flow.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use vgen_models::{JobStatus, SeedGeneration, SeedStatus, StyleSet, VariationJob};

use crate::error::SessionResult;

/// Stage of the review flow. Transitions only move forward; the single
/// backward move is an explicit [`ProcessingSession::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    /// The original seed video is still rendering
    Generating,
    /// Original completed; reviewer decides to publish or make variations
    Ready,
    /// Reviewer is selecting style sets / variations are in flight
    VariationConfig,
    /// Every variant is terminal; reviewer compares and approves
    CompareAndApprove,
}

impl SessionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generating => "generating",
            Self::Ready => "ready",
            Self::VariationConfig => "variation_config",
            Self::CompareAndApprove => "compare_and_approve",
        }
    }
}

impl std::fmt::Display for SessionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer decision on one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approval {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// The session's view of the original seed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalVideo {
    pub seed_id: String,
    pub prompt: String,
    pub status: SeedStatus,
    /// Progress (0-100); forced to 100 on completion
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
}

impl OriginalVideo {
    pub fn from_seed(seed: &SeedGeneration) -> Self {
        let completed = seed.status == SeedStatus::Completed;
        Self {
            seed_id: seed.id.clone(),
            prompt: seed.prompt.clone(),
            status: seed.status,
            progress: if completed { 100 } else { 0 },
            output_url: seed.output_url.clone(),
        }
    }
}

/// One variant as the reviewer sees it. A denormalized copy of a
/// `VariationJob` row, plus the purely local approval decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationVideo {
    /// Local view-model id, assigned before any job row exists
    pub id: String,
    /// Store-side job id, attached once the batch is created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Style set that spawned this variant
    pub style_id: String,
    pub label: String,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub approval: Approval,
}

impl VariationVideo {
    fn pending(style: &StyleSet) -> Self {
        Self {
            id: format!("vv_{}", Uuid::new_v4()),
            job_id: None,
            style_id: style.id.to_string(),
            label: style.settings().label(),
            status: JobStatus::Pending,
            progress: 0,
            output_url: None,
            error_message: None,
            approval: Approval::Pending,
        }
    }

    fn from_job(job: &VariationJob) -> Self {
        Self {
            id: format!("vv_{}", Uuid::new_v4()),
            job_id: Some(job.id.as_str().to_string()),
            style_id: String::new(),
            label: job.variation_label.clone(),
            status: job.status,
            progress: job.progress,
            output_url: job.output_url.clone(),
            error_message: job.error_message.clone(),
            approval: Approval::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn matches(&self, id: &str) -> bool {
        self.id == id || self.job_id.as_deref() == Some(id)
    }
}

/// Style selection state for the variation-config stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationConfigState {
    /// Selection order is preserved; it drives view-model creation order
    pub selected_style_ids: Vec<String>,
    pub is_generating: bool,
}

/// An asynchronous status update for one variant, from either the callback
/// receiver or the poller. `id` may be the local view-model id or the
/// store-side job id; lookups try both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobUpdate {
    pub id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobUpdate {
    pub fn from_job(job: &VariationJob) -> Self {
        Self {
            id: job.id.as_str().to_string(),
            status: job.status,
            progress: Some(job.progress),
            output_url: job.output_url.clone(),
            error_message: job.error_message.clone(),
        }
    }
}

/// An entry in the approved-videos list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovedVideo {
    /// Job id for variants, seed id for the original
    pub id: String,
    pub url: String,
    pub is_original: bool,
}

/// One reviewer processing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSession {
    pub stage: SessionStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<OriginalVideo>,
    #[serde(default)]
    pub config: VariationConfigState,
    #[serde(default)]
    pub variations: Vec<VariationVideo>,
    /// Batch the current variations belong to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

impl Default for ProcessingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingSession {
    pub fn new() -> Self {
        Self {
            stage: SessionStage::Generating,
            original: None,
            config: VariationConfigState::default(),
            variations: Vec::new(),
            batch_id: None,
        }
    }

    /// Start a session for a seed. A seed that is already completed enters
    /// `Ready` immediately.
    pub fn for_seed(seed: &SeedGeneration) -> Self {
        let mut session = Self::new();
        session.original = Some(OriginalVideo::from_seed(seed));
        if seed.status == SeedStatus::Completed {
            session.stage = SessionStage::Ready;
        }
        session
    }

    /// Apply a status update for the original seed video. The instant the
    /// original flips to completed, progress is forced to 100, the output
    /// URL is recorded, and the session auto-enters `Ready`.
    pub fn apply_original_update(&mut self, status: SeedStatus, output_url: Option<String>) {
        let Some(original) = self.original.as_mut() else {
            return;
        };
        original.status = status;
        if status == SeedStatus::Completed {
            original.progress = 100;
            if output_url.is_some() {
                original.output_url = output_url;
            }
            if self.stage == SessionStage::Generating {
                info!(seed_id = %original.seed_id, "Original completed, session ready");
                self.stage = SessionStage::Ready;
            }
        }
    }

    /// Enter the variation-config stage from `Ready`.
    pub fn begin_variation_config(&mut self) {
        if self.stage == SessionStage::Ready {
            self.stage = SessionStage::VariationConfig;
        }
    }

    /// Toggle one style set in or out of the selection.
    pub fn toggle_style(&mut self, style_id: &str) {
        if let Some(pos) = self
            .config
            .selected_style_ids
            .iter()
            .position(|s| s == style_id)
        {
            self.config.selected_style_ids.remove(pos);
        } else if StyleSet::find(style_id).is_some() {
            self.config.selected_style_ids.push(style_id.to_string());
        }
    }

    /// Select every style set in the catalog.
    pub fn select_all_styles(&mut self) {
        self.config.selected_style_ids =
            StyleSet::ALL.iter().map(|s| s.id.to_string()).collect();
    }

    pub fn clear_styles(&mut self) {
        self.config.selected_style_ids.clear();
    }

    /// Start variation generation: synthesize one pending view-model per
    /// selected style and flag the session as generating. The actual
    /// combination/factory/dispatch chain runs server-side at this moment;
    /// job ids attach afterwards via [`Self::bind_jobs`].
    pub fn start_variations(&mut self) -> &[VariationVideo] {
        self.variations = self
            .config
            .selected_style_ids
            .iter()
            .filter_map(|id| StyleSet::find(id))
            .map(VariationVideo::pending)
            .collect();
        self.config.is_generating = !self.variations.is_empty();
        &self.variations
    }

    /// Attach the created job rows to the pending view-models, pairing in
    /// creation order (job creation order matches selection order).
    pub fn bind_jobs(&mut self, batch_id: &str, jobs: &[VariationJob]) {
        self.batch_id = Some(batch_id.to_string());
        for (video, job) in self.variations.iter_mut().zip(jobs) {
            video.job_id = Some(job.id.as_str().to_string());
            video.label = job.variation_label.clone();
        }
    }

    /// Apply an asynchronous status update, matching by local or remote id.
    ///
    /// Returns false for ids no longer tracked (e.g. after a cancel), which
    /// makes late callbacks for an abandoned batch safe no-ops. The
    /// all-terminal check is recomputed from the full current state on every
    /// call because updates arrive in any order.
    pub fn apply_job_update(&mut self, update: &JobUpdate) -> bool {
        let Some(video) = self.variations.iter_mut().find(|v| v.matches(&update.id)) else {
            debug!(id = %update.id, "Update for untracked variant ignored");
            return false;
        };

        video.status = update.status;
        if let Some(progress) = update.progress {
            video.progress = progress;
        }
        match update.status {
            JobStatus::Completed => {
                video.progress = 100;
                if update.output_url.is_some() {
                    video.output_url = update.output_url.clone();
                }
            }
            JobStatus::Failed => {
                video.progress = 100;
                if update.error_message.is_some() {
                    video.error_message = update.error_message.clone();
                }
            }
            _ => {}
        }

        self.recompute_generation_state();
        true
    }

    /// Replace the variation view-models wholesale from store rows. Local
    /// state may have drifted (page reload mid-batch); the rows win. The
    /// reviewer's approval decisions are local-only state and carry over for
    /// matching job ids.
    pub fn reconcile(&mut self, batch_id: &str, jobs: &[VariationJob]) {
        let approvals: Vec<(String, Approval)> = self
            .variations
            .iter()
            .filter_map(|v| v.job_id.clone().map(|id| (id, v.approval)))
            .collect();

        self.batch_id = Some(batch_id.to_string());
        self.variations = jobs.iter().map(VariationVideo::from_job).collect();
        for video in &mut self.variations {
            if let Some(job_id) = &video.job_id {
                if let Some((_, approval)) = approvals.iter().find(|(id, _)| id == job_id) {
                    video.approval = *approval;
                }
            }
        }

        if self.stage == SessionStage::Ready && !self.variations.is_empty() {
            self.stage = SessionStage::VariationConfig;
        }
        self.config.is_generating = !self.variations.is_empty();
        self.recompute_generation_state();
    }

    /// Drop all in-flight variation view-models. No cancel signal is sent
    /// upstream; already-dispatched renders keep running and their late
    /// callbacks land as no-ops.
    pub fn cancel_variations(&mut self) {
        info!(count = self.variations.len(), "Variation generation cancelled");
        self.variations.clear();
        self.config.is_generating = false;
        self.batch_id = None;
    }

    fn recompute_generation_state(&mut self) {
        if self.variations.is_empty() || !self.config.is_generating {
            return;
        }
        if self.variations.iter().all(VariationVideo::is_terminal) {
            self.config.is_generating = false;
            if self.stage == SessionStage::VariationConfig {
                info!("All variants terminal, entering compare-and-approve");
                self.stage = SessionStage::CompareAndApprove;
            }
        }
    }

    /// Set one variant's approval, by local or remote id.
    pub fn set_approval(&mut self, id: &str, approval: Approval) -> bool {
        match self.variations.iter_mut().find(|v| v.matches(id)) {
            Some(video) => {
                video.approval = approval;
                true
            }
            None => false,
        }
    }

    /// Approve every completed variant. Failed and in-flight variants are
    /// untouched.
    pub fn approve_all(&mut self) {
        for video in &mut self.variations {
            if video.status == JobStatus::Completed {
                video.approval = Approval::Approved;
            }
        }
    }

    /// Reject every completed variant.
    pub fn reject_all(&mut self) {
        for video in &mut self.variations {
            if video.status == JobStatus::Completed {
                video.approval = Approval::Rejected;
            }
        }
    }

    /// Videos cleared for publishing: the original (when it has an output
    /// URL) plus every approved, completed variant with an output URL and a
    /// bound job id. Each appears exactly once.
    pub fn approved_videos(&self) -> Vec<ApprovedVideo> {
        let mut approved = Vec::new();

        if let Some(original) = &self.original {
            if let Some(url) = &original.output_url {
                approved.push(ApprovedVideo {
                    id: original.seed_id.clone(),
                    url: url.clone(),
                    is_original: true,
                });
            }
        }

        for video in &self.variations {
            if video.approval != Approval::Approved || video.status != JobStatus::Completed {
                continue;
            }
            let (Some(job_id), Some(url)) = (&video.job_id, &video.output_url) else {
                continue;
            };
            if approved.iter().any(|a| a.id == *job_id) {
                continue;
            }
            approved.push(ApprovedVideo {
                id: job_id.clone(),
                url: url.clone(),
                is_original: false,
            });
        }

        approved
    }

    /// Explicit reset to the initial stage, dropping everything.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn to_json(&self) -> SessionResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> SessionResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
