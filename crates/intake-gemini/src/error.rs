//! Gemini client error types.

use thiserror::Error;

use crate::types::ErrorEnvelope;

pub type GeminiResult<T> = Result<T, GeminiError>;

/// Reason code the provider attaches to rejected credentials.
pub const API_KEY_INVALID: &str = "API_KEY_INVALID";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Invalid API key (API_KEY_INVALID): {0}")]
    InvalidApiKey(String),

    #[error("Gemini API returned {status}: {message}")]
    Api {
        status: u16,
        /// Canonical code name, e.g. `INVALID_ARGUMENT`
        code: Option<String>,
        /// `ErrorInfo.reason`, when the provider sent one
        reason: Option<String>,
        message: String,
    },

    #[error("File {name} failed processing: {message}")]
    ProcessingFailed { name: String, message: String },

    #[error("File {name} still processing after {waited_secs} seconds")]
    Timeout { name: String, waited_secs: u64 },

    #[error("Prompt blocked: {0}")]
    Blocked(String),

    #[error("No content in Gemini response")]
    EmptyResponse,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeminiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Classify a non-success HTTP response.
    ///
    /// Uses the structured `ErrorInfo.reason` when the body is a Gemini error
    /// envelope and falls back to the raw body text otherwise.
    pub fn from_api_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => {
                let reason = envelope
                    .error
                    .details
                    .into_iter()
                    .find_map(|d| d.reason);
                let message = if envelope.error.message.is_empty() {
                    body.trim().to_string()
                } else {
                    envelope.error.message
                };

                if reason.as_deref() == Some(API_KEY_INVALID) || message.contains(API_KEY_INVALID)
                {
                    Self::InvalidApiKey(message)
                } else {
                    Self::Api {
                        status,
                        code: envelope.error.status,
                        reason,
                        message,
                    }
                }
            }
            Err(_) if body.contains(API_KEY_INVALID) => Self::InvalidApiKey(body.trim().to_string()),
            Err(_) => Self::Api {
                status,
                code: None,
                reason: None,
                message: body.trim().to_string(),
            },
        }
    }

    /// Whether the provider rejected the credential.
    ///
    /// The substring check covers error shapes this client does not parse.
    pub fn is_invalid_api_key(&self) -> bool {
        matches!(self, GeminiError::InvalidApiKey(_)) || self.to_string().contains(API_KEY_INVALID)
    }

    /// Whether another model might succeed where this one failed.
    pub fn is_model_unavailable(&self) -> bool {
        match self {
            GeminiError::Api { status, .. } => {
                *status == 404 || *status == 429 || *status >= 500
            }
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GeminiError::Timeout { .. })
    }
}
