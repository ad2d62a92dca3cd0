//! Render error types.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render engine not configured: {0}")]
    NotConfigured(String),

    #[error("Submission failed: {0}")]
    SubmitFailed(String),

    #[error("Render engine returned {status}: {body}")]
    EngineStatus { status: u16, body: String },

    #[error("Status check failed: {0}")]
    StatusFailed(String),

    #[error("Render timed out after {0} seconds")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error: {0}")]
    Store(#[from] vgen_store::StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn submit_failed(msg: impl Into<String>) -> Self {
        Self::SubmitFailed(msg.into())
    }

    pub fn status_failed(msg: impl Into<String>) -> Self {
        Self::StatusFailed(msg.into())
    }
}
