//! Analysis payloads exchanged with the intake page.

use serde::{Deserialize, Serialize};

use crate::video::VideoFormat;

/// Summary of the staged upload, echoed back for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFileSummary {
    /// Name the browser sent with the upload
    pub original_name: String,
    /// Detected container format
    pub format: VideoFormat,
    /// Bytes written to the staging file
    pub size_bytes: u64,
}

/// Successful analysis response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Always `"ok"`
    pub status: String,
    /// Model output, markdown formatted
    pub content: String,
    /// `content` rendered to HTML, with any raw HTML from the model escaped
    pub content_html: String,
    /// Model that produced the content
    pub model: String,
    pub file: StagedFileSummary,
    /// Wall-clock time for upload, processing and generation
    pub elapsed_ms: u64,
}

impl AnalysisResponse {
    pub fn ok(
        content: impl Into<String>,
        content_html: impl Into<String>,
        model: impl Into<String>,
        file: StagedFileSummary,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            status: "ok".to_string(),
            content: content.into(),
            content_html: content_html.into(),
            model: model.into(),
            file,
            elapsed_ms,
        }
    }
}
