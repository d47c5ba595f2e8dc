//! Axum HTTP server for the patient video intake page.
//!
//! This crate provides:
//! - The single-page upload form and its `/api/analyze` endpoint
//! - Staging of uploads in per-request temp files
//! - Rate limiting and security headers
//! - Prometheus metrics

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
pub use services::AnalysisService;
pub use state::AppState;
