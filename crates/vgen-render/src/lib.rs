//! Render orchestration: submission to the remote compose engine, batch
//! dispatch, and convergent status updates.
//!
//! Each variation job is submitted independently; one submission failing
//! never blocks or cancels siblings. Completion arrives by callback (push,
//! authoritative) or by polling (pull, local-dev fallback); both paths apply
//! the same terminal-update function on the job store.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod status;

pub use client::{
    ComposeClient, ComposeConfig, RenderAudio, RenderImage, RenderOutput, RenderRequest,
    RenderScript, RenderSettings, RenderStatusResponse, RenderSubmitter, SubmitResponse,
};
pub use dispatch::{dispatch_all, dispatch_job, for_each_chunked, DispatchOutcome, SharedAssets};
pub use error::{RenderError, RenderResult};
pub use factory::create_jobs;
pub use status::{apply_callback, poll_until_terminal, CallbackPayload, PollerConfig};
