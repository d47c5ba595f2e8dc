//! Video analysis handler.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use futures_util::TryStreamExt;
use intake_models::{AnalysisResponse, VideoFormat};
use tokio_util::io::StreamReader;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult, MISSING_VIDEO_MESSAGE};
use crate::metrics;
use crate::services::markdown::render_markdown;
use crate::services::{AnalysisService, StagedVideo};
use crate::state::AppState;

/// Analyze an uploaded patient video.
///
/// Expects a multipart body with a `video` file part and a `query` text part.
/// The staged file is removed before the response is returned, whatever the
/// outcome.
pub async fn analyze_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisResponse>> {
    let start = Instant::now();

    let result: ApiResult<Json<AnalysisResponse>> = async {
        let (staged, query) = read_form(&state, &mut multipart).await?;
        let staged = staged.ok_or_else(|| ApiError::bad_request(MISSING_VIDEO_MESSAGE))?;
        let query = query.unwrap_or_default();
        let response = run_analysis(&state, &staged, &query, start).await;

        if let Err(e) = staged.cleanup() {
            warn!("Failed to remove staged video: {}", e);
        }
        response
    }
    .await;

    match result {
        Ok(response) => {
            metrics::record_analysis("ok");
            Ok(response)
        }
        Err(e) => {
            metrics::record_analysis(e.code().unwrap_or("rejected"));
            warn!("Analysis request failed: {}", e);
            // Drain the rest of the body so the browser sees the response instead of a reset
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}

async fn run_analysis(
    state: &AppState,
    staged: &StagedVideo,
    query: &str,
    start: Instant,
) -> ApiResult<Json<AnalysisResponse>> {
    // Checked once the upload is in hand so no remote call happens without a question
    let query = AnalysisService::validate_query(query)?;

    info!(
        file = staged.original_name(),
        format = %staged.format(),
        size_bytes = staged.size_bytes(),
        "Starting analysis"
    );

    let generated = state.analysis.analyze(staged, query).await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    info!(model = %generated.model, elapsed_ms, "Analysis complete");

    let content_html = render_markdown(&generated.content);
    Ok(Json(AnalysisResponse::ok(
        generated.content,
        content_html,
        generated.model,
        staged.summary(),
        elapsed_ms,
    )))
}

/// Read the `video` and `query` parts, staging the video as it streams in.
async fn read_form(
    state: &AppState,
    multipart: &mut Multipart,
) -> ApiResult<(Option<StagedVideo>, Option<String>)> {
    let mut staged: Option<StagedVideo> = None;
    let mut query: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => {
                let original_name = field.file_name().unwrap_or("unnamed").to_string();
                let format = VideoFormat::detect(field.file_name(), field.content_type())
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;

                let reader = StreamReader::new(field.map_err(std::io::Error::other));
                let video = state
                    .stager
                    .stage(&original_name, format, reader)
                    .await
                    .map_err(body_limit_error)?;
                metrics::record_staged_bytes(video.size_bytes());

                // A repeated part replaces the earlier one, which is removed on drop
                staged = Some(video);
            }
            "query" => {
                query = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    Ok((staged, query))
}

const LENGTH_LIMIT_EXCEEDED: &str = "length limit exceeded";

fn payload_too_large() -> ApiError {
    ApiError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    let msg = e.to_string();
    if msg.contains(LENGTH_LIMIT_EXCEEDED) {
        payload_too_large()
    } else {
        ApiError::BadRequest(msg)
    }
}

/// The body limit can also trip mid-stream, surfacing as an IO error from staging.
fn body_limit_error(e: ApiError) -> ApiError {
    match e {
        ApiError::Io(ref io) if io.to_string().contains(LENGTH_LIMIT_EXCEEDED) => {
            payload_too_large()
        }
        other => other,
    }
}
