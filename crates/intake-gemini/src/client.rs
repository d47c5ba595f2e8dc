//! Gemini HTTP client.

use std::path::Path;
use std::time::Duration;

use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, Response};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::credential::ApiKey;
use crate::error::{GeminiError, GeminiResult};
use crate::poll::{wait_for, PollPolicy, Check, WaitError};
use crate::types::{
    Content, FileState, GenerateContentRequest, GenerateContentResponse, GeneratedContent,
    ModelInfo, Part, RemoteFile, StartUploadRequest, UploadMetadata, UploadResponse,
};

/// Public Gemini endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when `GEMINI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";
const SYSTEM_INSTRUCTION: &str = "Use markdown to format your answers.";

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    /// Base URL, without the `/v1beta` suffix
    pub base_url: String,
    /// Preferred model
    pub model: String,
    /// Models tried in order when the preferred one is unavailable
    pub fallback_models: Vec<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Polling while an uploaded file is processing
    pub poll: PollPolicy,
    /// Delete uploaded files once a request is done with them
    pub delete_remote_files: bool,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            fallback_models: Vec::new(),
            timeout: Duration::from_secs(120),
            poll: PollPolicy::default(),
            delete_remote_files: true,
        }
    }
}

impl GeminiClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = PollPolicy::default();
        let millis = |var: &str, default: Duration| {
            std::env::var(var)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            fallback_models: std::env::var("GEMINI_FALLBACK_MODELS")
                .map(|s| {
                    s.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("GEMINI_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            poll: PollPolicy {
                interval: millis("GEMINI_POLL_INTERVAL_MS", defaults.interval),
                max_interval: millis("GEMINI_POLL_MAX_INTERVAL_MS", defaults.max_interval),
                multiplier: std::env::var("GEMINI_POLL_BACKOFF")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.multiplier),
                max_wait: std::env::var("GEMINI_POLL_MAX_WAIT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.max_wait),
            },
            delete_remote_files: std::env::var("GEMINI_DELETE_REMOTE_FILES")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    /// Preferred model followed by the fallbacks, without duplicates.
    pub fn models(&self) -> Vec<&str> {
        let mut models = vec![self.model.as_str()];
        for m in &self.fallback_models {
            if !models.contains(&m.as_str()) {
                models.push(m.as_str());
            }
        }
        models
    }
}

/// Client for the Gemini file and generation APIs.
pub struct GeminiClient {
    http: Client,
    api_key: ApiKey,
    config: GeminiClientConfig,
}

impl GeminiClient {
    /// Create a new client.
    pub fn new(api_key: ApiKey, config: GeminiClientConfig) -> GeminiResult<Self> {
        if config.model.trim().is_empty() {
            return Err(GeminiError::config("model name is empty"));
        }
        config.poll.validate().map_err(GeminiError::Config)?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GeminiError::Network)?;

        Ok(Self {
            http,
            api_key,
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        Self::new(ApiKey::from_env()?, GeminiClientConfig::from_env())
    }

    pub fn config(&self) -> &GeminiClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Upload a local file with the resumable upload protocol.
    pub async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> GeminiResult<RemoteFile> {
        let size = tokio::fs::metadata(path).await?.len();
        debug!(path = %path.display(), size, mime_type, "Starting upload");

        let start = self
            .http
            .post(self.url("upload/v1beta/files"))
            .header(API_KEY_HEADER, self.api_key.expose())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&StartUploadRequest {
                file: UploadMetadata {
                    display_name: display_name.to_string(),
                },
            })
            .send()
            .await?;

        if !start.status().is_success() {
            return Err(error_from_response(start).await);
        }

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| GeminiError::invalid_response("no upload URL in start response"))?
            .to_string();

        let file = tokio::fs::File::open(path).await?;
        let response = self
            .http
            .post(&upload_url)
            .header(CONTENT_LENGTH, size)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let uploaded: UploadResponse = response.json().await?;
        info!(
            file = %uploaded.file.name,
            state = uploaded.file.state.as_str(),
            "Uploaded file"
        );
        Ok(uploaded.file)
    }

    /// Fetch the current state of an uploaded file.
    pub async fn get_file(&self, name: &str) -> GeminiResult<RemoteFile> {
        let response = self
            .http
            .get(self.url(&format!("v1beta/{}", name)))
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    /// Delete an uploaded file.
    pub async fn delete_file(&self, name: &str) -> GeminiResult<()> {
        let response = self
            .http
            .delete(self.url(&format!("v1beta/{}", name)))
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        debug!(file = name, "Deleted remote file");
        Ok(())
    }

    /// Poll until `file` leaves `PROCESSING`.
    ///
    /// `FAILED` is reported as [`GeminiError::ProcessingFailed`]; any other
    /// non-processing state is returned as is.
    pub async fn wait_until_active(&self, file: RemoteFile) -> GeminiResult<RemoteFile> {
        if !file.state.is_processing() {
            return check_not_failed(file);
        }

        let client = self;
        let name = file.name.as_str();
        let result = wait_for(&self.config.poll, move || async move {
            let current = client.get_file(name).await?;
            Ok::<_, GeminiError>(if current.state.is_processing() {
                Check::Pending
            } else {
                Check::Done(current)
            })
        })
        .await;

        match result {
            Ok(current) => {
                debug!(file = name, state = current.state.as_str(), "File left processing");
                check_not_failed(current)
            }
            Err(WaitError::TimedOut { waited, attempts }) => {
                warn!(file = name, attempts, "Gave up waiting for file processing");
                Err(GeminiError::Timeout {
                    name: name.to_string(),
                    waited_secs: waited.as_secs(),
                })
            }
            Err(WaitError::Failed(e)) => Err(e),
        }
    }

    /// Generate content, falling back through the configured models.
    ///
    /// Only "model unavailable" failures move on to the next model.
    pub async fn generate(
        &self,
        prompt: &str,
        files: &[RemoteFile],
    ) -> GeminiResult<GeneratedContent> {
        let mut last_error = None;

        for model in self.config.models() {
            info!("Attempting Gemini API with model: {}", model);
            match self.generate_with_model(model, prompt, files).await {
                Ok(generated) => return Ok(generated),
                Err(e) if e.is_model_unavailable() => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(GeminiError::EmptyResponse))
    }

    /// Single `generateContent` call against `model`.
    pub async fn generate_with_model(
        &self,
        model: &str,
        prompt: &str,
        files: &[RemoteFile],
    ) -> GeminiResult<GeneratedContent> {
        let mut parts: Vec<Part> = files.iter().map(Part::file).collect();
        parts.push(Part::text(prompt));

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(SYSTEM_INSTRUCTION)],
            }),
        };

        let response = self
            .http
            .post(self.url(&format!("v1beta/models/{}:generateContent", model)))
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: GenerateContentResponse = response.json().await?;
        extract_content(model, body)
    }

    /// Fetch metadata of the configured model.
    pub async fn health_check(&self) -> GeminiResult<ModelInfo> {
        let response = self
            .http
            .get(self.url(&format!("v1beta/models/{}", self.config.model)))
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }
}

async fn error_from_response(response: Response) -> GeminiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    GeminiError::from_api_response(status, &body)
}

fn check_not_failed(file: RemoteFile) -> GeminiResult<RemoteFile> {
    if file.state == FileState::Failed {
        let message = file
            .error
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "no details provided".to_string());
        return Err(GeminiError::ProcessingFailed {
            name: file.name,
            message,
        });
    }
    Ok(file)
}

fn extract_content(model: &str, body: GenerateContentResponse) -> GeminiResult<GeneratedContent> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GeminiError::Blocked(reason));
    }

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or(GeminiError::EmptyResponse)?;

    let content: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if content.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_default();
        return match reason.as_str() {
            "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" => Err(GeminiError::Blocked(reason)),
            _ => Err(GeminiError::EmptyResponse),
        };
    }

    Ok(GeneratedContent {
        content,
        model: body.model_version.unwrap_or_else(|| model.to_string()),
        finish_reason: candidate.finish_reason,
    })
}
