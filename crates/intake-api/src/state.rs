//! Application state.

use std::sync::Arc;

use intake_gemini::GeminiClient;

use crate::config::ApiConfig;
use crate::services::{AnalysisService, VideoStager};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub gemini: Arc<GeminiClient>,
    pub analysis: AnalysisService,
    pub stager: VideoStager,
}

impl AppState {
    /// Create new application state around an initialized client.
    pub fn new(config: ApiConfig, gemini: GeminiClient) -> Self {
        let gemini = Arc::new(gemini);
        let analysis = AnalysisService::new(Arc::clone(&gemini));
        let stager = VideoStager::new(config.temp_dir.clone());

        Self {
            config,
            gemini,
            analysis,
            stager,
        }
    }
}
