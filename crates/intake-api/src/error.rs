//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use intake_gemini::GeminiError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Shown when the query box is empty.
pub const MISSING_QUERY_MESSAGE: &str = "Please enter a question or insight to analyze the video.";

/// Shown when no video was attached.
pub const MISSING_VIDEO_MESSAGE: &str = "Please upload a video file to proceed.";

/// Shown when the provider rejects the configured credential.
pub const INVALID_API_KEY_MESSAGE: &str =
    "The provided API key is invalid. Please check and enter a valid key.";

/// Shown for local failures such as a full staging disk.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Shown for every other analysis failure, next to the raw error text.
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "An unexpected error occurred during analysis. Please try again later.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Please enter a question or insight to analyze the video.")]
    MissingQuery,

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] GeminiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::MissingQuery => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Analysis(e) if e.is_invalid_api_key() => StatusCode::UNAUTHORIZED,
            ApiError::Analysis(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Analysis(_) => StatusCode::BAD_GATEWAY,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code the page switches on.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::MissingQuery => Some("missing_query"),
            ApiError::Analysis(e) if e.is_invalid_api_key() => Some("api_key_invalid"),
            ApiError::Analysis(e) if e.is_timeout() => Some("analysis_timeout"),
            ApiError::Analysis(_) => Some("analysis_failed"),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    /// Raw error text for analysis failures
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code().map(str::to_string);

        let (detail, error) = match &self {
            ApiError::MissingQuery => (MISSING_QUERY_MESSAGE.to_string(), None),
            ApiError::Analysis(e) if e.is_invalid_api_key() => {
                (INVALID_API_KEY_MESSAGE.to_string(), None)
            }
            ApiError::Analysis(e) => (ANALYSIS_FAILED_MESSAGE.to_string(), Some(e.to_string())),
            // Local paths stay in the log, not the response
            ApiError::Io(e) => {
                error!("Internal error: {}", e);
                (INTERNAL_ERROR_MESSAGE.to_string(), None)
            }
            _ => (self.to_string(), None),
        };

        let body = ErrorResponse {
            detail,
            code,
            error,
        };

        (status, Json(body)).into_response()
    }
}
