//! Video analysis: upload, wait for processing, generate.

use std::sync::Arc;
use std::time::Instant;

use intake_gemini::{GeminiClient, GeminiResult, GeneratedContent, RemoteFile};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::prompt::build_analysis_prompt;
use crate::services::staging::StagedVideo;

/// Runs one analysis per call against a shared Gemini client.
#[derive(Clone)]
pub struct AnalysisService {
    gemini: Arc<GeminiClient>,
}

impl AnalysisService {
    pub fn new(gemini: Arc<GeminiClient>) -> Self {
        Self { gemini }
    }

    /// Trimmed query, or [`ApiError::MissingQuery`] when there is nothing to ask.
    pub fn validate_query(query: &str) -> ApiResult<&str> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::MissingQuery);
        }
        Ok(query)
    }

    /// Analyze a staged video.
    ///
    /// The remote copy is deleted afterwards when configured, whatever the
    /// outcome; deletion failures are only logged.
    pub async fn analyze(
        &self,
        video: &StagedVideo,
        query: &str,
    ) -> GeminiResult<GeneratedContent> {
        let prompt = build_analysis_prompt(query);

        let start = Instant::now();
        let uploaded = self
            .gemini
            .upload_file(video.path(), video.format().mime_type(), video.original_name())
            .await?;
        metrics::record_upload_duration(start.elapsed().as_secs_f64());

        let name = uploaded.name.clone();
        let result = self.process(uploaded, &prompt).await;

        if self.gemini.config().delete_remote_files {
            if let Err(e) = self.gemini.delete_file(&name).await {
                warn!(file = %name, "Failed to delete remote file: {}", e);
            }
        }

        result
    }

    async fn process(
        &self,
        uploaded: RemoteFile,
        prompt: &str,
    ) -> GeminiResult<GeneratedContent> {
        let start = Instant::now();
        let ready = self.gemini.wait_until_active(uploaded).await?;
        metrics::record_processing_wait(start.elapsed().as_secs_f64());
        info!(
            file = %ready.name,
            state = ready.state.as_str(),
            wait_ms = start.elapsed().as_millis() as u64,
            "File ready for inference"
        );

        let start = Instant::now();
        let generated = self.gemini.generate(prompt, &[ready]).await?;
        metrics::record_generate_duration(&generated.model, start.elapsed().as_secs_f64());

        Ok(generated)
    }
}
