//! Axum HTTP API server.
//!
//! This crate provides:
//! - The variation-generation endpoint and batch/variation status reads
//! - The render engine callback receiver
//! - Bearer-token auth with label-based access control
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
