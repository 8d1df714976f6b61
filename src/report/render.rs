//! Markdown to HTML conversion for the report panel.

use super::metadata::ReportMetadata;
use super::view::ReportView;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use regex::Regex;
use std::panic::{self, AssertUnwindSafe};

static MARKDOWN_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#*`\[\]()]").expect("valid punctuation pattern"));
static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").expect("valid newline pattern"));

/// Render report markdown into a panel state.
///
/// Blank content is the empty panel. A formatter panic becomes a warning
/// panel instead of propagating.
pub fn render_markdown(content: &str, metadata: Option<ReportMetadata>) -> ReportView {
    if content.trim().is_empty() {
        return ReportView::Empty;
    }

    match panic::catch_unwind(AssertUnwindSafe(|| markdown_to_html(content))) {
        Ok(html) => ReportView::Loaded { html, metadata },
        Err(panic_info) => {
            let reason = if let Some(s) = panic_info.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown error".to_string()
            };
            tracing::error!("Markdown formatting panicked: {}", reason);
            ReportView::Warning {
                title: "Error Displaying Report".to_string(),
                message: format!("Could not format the report content: {}", reason),
            }
        }
    }
}

/// Schemes a link or image may point at; scheme-less destinations are relative
const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Replace a link destination with `#` unless it is relative or uses an allowed scheme
fn safe_destination(dest: CowStr<'_>) -> CowStr<'_> {
    // Browsers ignore whitespace and control characters inside a scheme
    let normalized: String = dest
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let scheme = normalized
        .find(|c: char| matches!(c, ':' | '/' | '?' | '#'))
        .filter(|&i| normalized[i..].starts_with(':'))
        .map(|i| &normalized[..i]);

    match scheme {
        Some(scheme) if !ALLOWED_SCHEMES.contains(&scheme) => {
            tracing::warn!("Dropping report link with scheme '{}'", scheme);
            CowStr::Borrowed("#")
        }
        _ => dest,
    }
}

/// Convert markdown to HTML with raw HTML escaped and unsafe link targets removed.
///
/// Input that renders to nothing (e.g. only link definitions) falls back to
/// a preformatted copy of the source.
pub fn markdown_to_html(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(content, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, parser);

    if out.trim().is_empty() {
        format!("<pre>{}</pre>", escape_html(content))
    } else {
        out
    }
}

/// Plain-text preview with markdown punctuation stripped
pub fn report_preview(content: &str, max_len: usize) -> String {
    if content.trim().is_empty() {
        return "No content available".to_string();
    }

    let stripped = MARKDOWN_PUNCTUATION.replace_all(content, "");
    let flattened = NEWLINES.replace_all(&stripped, " ");
    let clean = flattened.trim();

    if clean.chars().count() <= max_len {
        clean.to_string()
    } else {
        let truncated: String = clean.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}

/// "Report Information" card for the loaded panel
pub fn metadata_card_html(metadata: &ReportMetadata) -> String {
    let field = |v: &Option<String>| escape_html(v.as_deref().unwrap_or("Unknown"));
    format!(
        concat!(
            r#"<div class="card report-meta"><h6>Report Information</h6><p class="small">"#,
            "<strong>File: </strong>{}<br>",
            "<strong>City: </strong>{}<br>",
            "<strong>Type: </strong>{}<br>",
            "<strong>Generated: </strong>{}<br>",
            "<strong>Size: </strong>{} bytes</p></div>"
        ),
        field(&metadata.filename),
        field(&metadata.city),
        field(&metadata.report_type),
        field(&metadata.created_time),
        metadata.file_size.unwrap_or(0)
    )
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
