//! Variation generation and status handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use vgen_models::{
    AutoPublish, BatchId, JobStatus, VariationJob, VariationJobId, VariationSettings,
};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::start_variation_batch;
use crate::state::AppState;

/// Request to begin variation generation for a seed.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVariationsRequest {
    /// Upper bound on variations; must be positive, clamped to the server cap
    #[validate(range(min = 1))]
    pub variation_count: Option<usize>,
    #[serde(default)]
    pub effect_presets: Vec<String>,
    #[serde(default)]
    pub color_grades: Vec<String>,
    #[serde(default)]
    pub text_styles: Vec<String>,
    #[serde(default)]
    pub vibe_variations: Vec<String>,
    pub auto_publish: Option<AutoPublish>,
}

/// One variation as returned to the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationView {
    pub id: String,
    pub variation_label: String,
    pub settings: VariationSettings,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&VariationJob> for VariationView {
    fn from(job: &VariationJob) -> Self {
        Self {
            id: job.id.as_str().to_string(),
            variation_label: job.variation_label.clone(),
            settings: job.settings,
            status: job.status,
            progress: job.progress,
            output_url: job.output_url.clone(),
            error_message: job.error_message.clone(),
        }
    }
}

/// Response for a created batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVariationsResponse {
    pub batch_id: String,
    pub total_count: usize,
    pub search_tags: Vec<String>,
    pub variations: Vec<VariationView>,
}

/// Batch status response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusResponse {
    pub batch_id: String,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub variations: Vec<VariationView>,
}

/// `POST /api/seeds/:seed_id/variations`
///
/// Returns 201 with every requested combination listed, including any that
/// already failed at persistence. Dispatch continues in the background.
pub async fn create_variations(
    State(state): State<AppState>,
    user: AuthUser,
    Path(seed_id): Path<String>,
    Json(request): Json<CreateVariationsRequest>,
) -> ApiResult<(StatusCode, Json<CreateVariationsResponse>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let outcome = start_variation_batch(&state, &user, &seed_id, &request).await?;

    let response = CreateVariationsResponse {
        batch_id: outcome.batch_id.as_str().to_string(),
        total_count: outcome.jobs.len(),
        search_tags: outcome.search_tags,
        variations: outcome.jobs.iter().map(VariationView::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /api/variations/:variation_id`
pub async fn get_variation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(variation_id): Path<String>,
) -> ApiResult<Json<VariationView>> {
    let id = VariationJobId::from_string(variation_id.clone());
    let job = state
        .jobs
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Variation {variation_id} not found")))?;

    ensure_seed_access(&state, &user, &job.seed_id).await?;

    Ok(Json(VariationView::from(&job)))
}

/// `GET /api/batches/:batch_id`
pub async fn get_batch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(batch_id): Path<String>,
) -> ApiResult<Json<BatchStatusResponse>> {
    let jobs = state
        .jobs
        .list_batch(&BatchId::from_string(batch_id.clone()))
        .await?;
    if jobs.is_empty() {
        return Err(ApiError::not_found(format!("Batch {batch_id} not found")));
    }

    ensure_seed_access(&state, &user, &jobs[0].seed_id).await?;

    let completed = jobs.iter().filter(|j| j.status == JobStatus::Completed).count();
    let failed = jobs.iter().filter(|j| j.status == JobStatus::Failed).count();

    Ok(Json(BatchStatusResponse {
        batch_id,
        total: jobs.len(),
        completed,
        failed,
        variations: jobs.iter().map(VariationView::from).collect(),
    }))
}

/// Access control goes through the owning seed's label.
async fn ensure_seed_access(state: &AppState, user: &AuthUser, seed_id: &str) -> ApiResult<()> {
    let seed = state
        .seeds
        .get(seed_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Seed {seed_id} not found")))?;
    user.ensure_label_access(&seed.label_id)
}
