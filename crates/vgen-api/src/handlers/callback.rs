//! Render engine callback receiver.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

use vgen_render::{apply_callback, CallbackPayload};
use vgen_store::Applied;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CallbackResponse {
    pub status: &'static str,
    pub applied: &'static str,
}

/// `POST /api/render/callback`
///
/// Always acknowledges with 200. Unknown job ids and duplicate reports are
/// no-ops; a non-200 here would only make the engine retry a report that
/// cannot change anything.
pub async fn render_callback(
    State(state): State<AppState>,
    Json(payload): Json<CallbackPayload>,
) -> ApiResult<Json<CallbackResponse>> {
    info!(job_id = %payload.job_id, status = ?payload.mapped_status, "Render callback received");

    let applied = apply_callback(state.jobs.as_ref(), &payload).await?;

    let applied = match applied {
        Some(Applied::Updated) => "updated",
        Some(Applied::AlreadyTerminal) => "already_terminal",
        Some(Applied::NotFound) => "unknown_job",
        None => "ignored",
    };
    Ok(Json(CallbackResponse {
        status: "ok",
        applied,
    }))
}
