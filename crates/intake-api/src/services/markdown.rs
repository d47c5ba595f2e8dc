//! Markdown rendering of model output.

use pulldown_cmark::{html, Event, Options, Parser};

/// Render model markdown to HTML for the page.
///
/// Raw HTML in the input is emitted as text, so the result is safe to
/// insert into the document.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
