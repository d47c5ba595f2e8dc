//! Upload page.

use axum::response::Html;
use intake_models::VideoFormat;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Serve the single-page upload form.
pub async fn index() -> Html<String> {
    Html(INDEX_HTML.replace("{{accept}}", &VideoFormat::accept_attribute()))
}
