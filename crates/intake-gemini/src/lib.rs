//! Client for Google's Gemini REST API.
//!
//! This crate covers the slice of the API the intake service needs:
//! - Resumable file upload and file status lookup
//! - Bounded polling until an uploaded file leaves `PROCESSING`
//! - `generateContent` with file references and model fallback
//! - File deletion and a model lookup for readiness probes

pub mod client;
pub mod credential;
pub mod error;
pub mod poll;
pub mod types;

pub use client::{GeminiClient, GeminiClientConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use credential::ApiKey;
pub use error::{GeminiError, GeminiResult};
pub use poll::{wait_for, PollPolicy, Check, WaitError};
pub use types::{FileState, GeneratedContent, ModelInfo, RemoteFile};
