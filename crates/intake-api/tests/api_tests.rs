//! HTTP API tests against a mocked Gemini backend.

use std::path::Path;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use intake_api::error::{
    ANALYSIS_FAILED_MESSAGE, INVALID_API_KEY_MESSAGE, MISSING_QUERY_MESSAGE, MISSING_VIDEO_MESSAGE,
};
use intake_api::services::prompt::SECTION_HEADERS;
use intake_api::{create_router, ApiConfig, AppState};
use intake_gemini::{ApiKey, GeminiClient, GeminiClientConfig, PollPolicy};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "intake-test-boundary";
const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

struct TestApp {
    router: Router,
    staging: TempDir,
}

fn test_app(server: &MockServer) -> TestApp {
    test_app_with_poll(
        server,
        PollPolicy::fixed(Duration::from_millis(10), Duration::from_secs(2)),
    )
}

fn test_app_with_poll(server: &MockServer, poll: PollPolicy) -> TestApp {
    let staging = TempDir::new().unwrap();
    let config = ApiConfig {
        temp_dir: staging.path().to_path_buf(),
        ..Default::default()
    };
    let gemini_config = GeminiClientConfig {
        base_url: server.uri(),
        poll,
        ..Default::default()
    };
    let gemini = GeminiClient::new(ApiKey::new("test-key").unwrap(), gemini_config).unwrap();

    TestApp {
        router: create_router(AppState::new(config, gemini), None),
        staging,
    }
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

enum Part<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn analyze_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn video_part(data: &[u8]) -> Part<'_> {
    Part::File {
        name: "video",
        file_name: "visit.mov",
        content_type: "video/quicktime",
        data,
    }
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn file_json(state: &str) -> Value {
    json!({
        "name": "files/abc123",
        "displayName": "visit.mov",
        "mimeType": "video/quicktime",
        "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
        "state": state
    })
}

async fn mount_upload(server: &MockServer) {
    let session_url = format!("{}/upload-session/1", server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-goog-upload-url", session_url.as_str()))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "file": file_json("PROCESSING") })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("ACTIVE")))
        .mount(server)
        .await;
}

fn structured_summary() -> String {
    SECTION_HEADERS
        .iter()
        .map(|h| format!("## {}\n- noted\n", h))
        .collect()
}

#[tokio::test]
async fn test_index_page() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = app
        .router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(html.to_vec()).unwrap();
    assert!(html.contains("AI Assisted Health Diagnostics"));
    assert!(html.contains("accept=\".mp4,.mov,.avi\""));
    assert!(!html.contains("{{accept}}"));
    assert!(html.contains("Analyse Video"));
    assert!(html.contains(MISSING_VIDEO_MESSAGE));
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let (status, body) = send(
        app.router,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reports_unreachable_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models/gemini-2.0-flash"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = send(
        app.router,
        Request::builder().uri("/ready").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["gemini"]["status"], "error");
    assert_eq!(body["checks"]["staging"]["status"], "ok");
}

#[tokio::test]
async fn test_empty_query_makes_no_remote_call() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = send(
        app.router,
        analyze_request(&[video_part(b"fake-video"), Part::Text { name: "query", value: "   " }]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "missing_query");
    assert_eq!(body["detail"], MISSING_QUERY_MESSAGE);
    assert!(dir_is_empty(app.staging.path()));
}

#[tokio::test]
async fn test_analyze_returns_structured_summary() {
    let server = MockServer::start().await;
    mount_upload(&server).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("Summarize symptoms"))
        .and(body_string_contains("files/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": structured_summary() }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(&server);
    let (status, body) = send(
        app.router,
        analyze_request(&[
            video_part(b"fake-video-bytes"),
            Part::Text {
                name: "query",
                value: "Summarize symptoms",
            },
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "gemini-2.0-flash");
    assert_eq!(body["file"]["original_name"], "visit.mov");
    assert_eq!(body["file"]["format"], "mov");
    assert_eq!(body["file"]["size_bytes"], 16);

    let content = body["content"].as_str().unwrap();
    let content_html = body["content_html"].as_str().unwrap();
    for header in SECTION_HEADERS {
        assert!(content.contains(header), "missing section {header}");
        assert!(content_html.contains(&format!("<h2>{}</h2>", header)));
    }

    // The prompt sent upstream carries every section heading
    let requests = server.received_requests().await.unwrap();
    let generate = requests.iter().find(|r| r.url.path() == GENERATE_PATH).unwrap();
    let sent = String::from_utf8_lossy(&generate.body);
    for header in SECTION_HEADERS {
        assert!(sent.contains(header));
    }

    // Uploaded bytes are the staged bytes
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/upload-session/1")
        .unwrap();
    assert_eq!(upload.body, b"fake-video-bytes".to_vec());

    assert!(dir_is_empty(app.staging.path()));
}

#[tokio::test]
async fn test_invalid_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason": "API_KEY_INVALID"
                }]
            }
        })))
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = send(
        app.router,
        analyze_request(&[
            video_part(b"fake-video"),
            Part::Text {
                name: "query",
                value: "Summarize symptoms",
            },
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "api_key_invalid");
    assert_eq!(body["detail"], INVALID_API_KEY_MESSAGE);
    assert!(body.get("error").is_none());
    assert!(dir_is_empty(app.staging.path()));
}

#[tokio::test]
async fn test_generation_failure_reports_raw_error() {
    let server = MockServer::start().await;
    mount_upload(&server).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "Request contains an invalid argument.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(&server);
    let (status, body) = send(
        app.router,
        analyze_request(&[
            video_part(b"fake-video"),
            Part::Text {
                name: "query",
                value: "Summarize symptoms",
            },
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "analysis_failed");
    assert_eq!(body["detail"], ANALYSIS_FAILED_MESSAGE);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Request contains an invalid argument."));
    assert!(dir_is_empty(app.staging.path()));
}

#[tokio::test]
async fn test_processing_timeout_maps_to_gateway_timeout() {
    let server = MockServer::start().await;
    let session_url = format!("{}/upload-session/1", server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-goog-upload-url", session_url.as_str()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "file": file_json("PROCESSING") })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("PROCESSING")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app_with_poll(
        &server,
        PollPolicy::fixed(Duration::from_millis(10), Duration::from_millis(60)),
    );
    let (status, body) = send(
        app.router,
        analyze_request(&[
            video_part(b"fake-video"),
            Part::Text {
                name: "query",
                value: "Summarize symptoms",
            },
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "analysis_timeout");
    assert_eq!(body["detail"], ANALYSIS_FAILED_MESSAGE);
    assert!(body["error"].as_str().unwrap().contains("files/abc123"));
    assert!(dir_is_empty(app.staging.path()));
}

#[tokio::test]
async fn test_unsupported_format_is_rejected() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let (status, body) = send(
        app.router,
        analyze_request(&[
            Part::File {
                name: "video",
                file_name: "notes.txt",
                content_type: "text/plain",
                data: b"not a video",
            },
            Part::Text {
                name: "query",
                value: "Summarize symptoms",
            },
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("notes.txt"));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(dir_is_empty(app.staging.path()));
}

#[tokio::test]
async fn test_missing_video_is_rejected() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let (status, body) = send(
        app.router,
        analyze_request(&[Part::Text {
            name: "query",
            value: "Summarize symptoms",
        }]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains(MISSING_VIDEO_MESSAGE));
    assert!(server.received_requests().await.unwrap().is_empty());
}
