//! Report panel and status indicator states, and their HTML fragments.

use super::metadata::ReportMetadata;
use super::render::{escape_html, metadata_card_html};
use serde::{Deserialize, Serialize};

/// Suggestions shown under a resolution failure
pub const DEFAULT_ERROR_SUGGESTIONS: [&str; 4] = [
    "Check that your query includes login credentials",
    "Ensure you've requested a specific analysis type",
    "Try rephrasing your request",
    "Contact support if the problem persists",
];

/// What the report panel currently shows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReportView {
    #[default]
    Empty,
    Loading,
    Loaded {
        html: String,
        metadata: Option<ReportMetadata>,
    },
    /// Content arrived but could not be formatted
    Warning { title: String, message: String },
    /// The report could not be obtained
    Error {
        title: String,
        message: String,
        suggestions: Vec<String>,
    },
}

impl ReportView {
    /// Resolution failure panel with the standard suggestions
    pub fn error(message: impl Into<String>) -> Self {
        ReportView::Error {
            title: "Report Error".to_string(),
            message: message.into(),
            suggestions: DEFAULT_ERROR_SUGGESTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ReportView::Loaded { .. })
    }

    pub fn to_html(&self) -> String {
        match self {
            ReportView::Empty => concat!(
                r#"<div class="report-empty">"#,
                r#"<div class="report-empty-icon">&#128196;</div>"#,
                "<h6>No Report Available</h6>",
                "<p>Start a conversation with the AI assistant to generate territory analysis reports. ",
                "Reports will appear here automatically when generated.</p>",
                "</div>"
            )
            .to_string(),
            ReportView::Loading => concat!(
                r#"<div class="report-loading">"#,
                r#"<div class="spinner"></div>"#,
                "<h6>Generating Report...</h6>",
                "<p>Please wait while the AI assistant generates your territory analysis report.</p>",
                "</div>"
            )
            .to_string(),
            ReportView::Loaded { html, metadata } => {
                let card = metadata
                    .as_ref()
                    .filter(|m| !m.is_empty())
                    .map(metadata_card_html)
                    .unwrap_or_default();
                format!(r#"<div class="report-loaded">{card}<article class="report-body">{html}</article></div>"#)
            }
            ReportView::Warning { title, message } => format!(
                r#"<div class="alert alert-warning"><h6>{}</h6><p>{}</p><hr><p>Please try regenerating the report.</p></div>"#,
                escape_html(title),
                escape_html(message)
            ),
            ReportView::Error {
                title,
                message,
                suggestions,
            } => {
                let items: String = suggestions
                    .iter()
                    .map(|s| format!("<li>{}</li>", escape_html(s)))
                    .collect();
                format!(
                    r#"<div class="alert alert-danger"><h6>{}</h6><p>{}</p><hr><p>Please try the following:</p><ul>{}</ul></div>"#,
                    escape_html(title),
                    escape_html(message),
                    items
                )
            }
        }
    }
}

/// Small status line above the report panel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StatusIndicator {
    #[default]
    Empty,
    Loading,
    Loaded {
        filename: Option<String>,
        created_time: Option<String>,
    },
    Error,
}

impl StatusIndicator {
    pub fn loaded(metadata: &ReportMetadata) -> Self {
        StatusIndicator::Loaded {
            filename: metadata.filename.clone(),
            created_time: metadata.created_time.clone(),
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            StatusIndicator::Empty => {
                r#"<small class="status status-empty">No report loaded</small>"#.to_string()
            }
            StatusIndicator::Loading => {
                r#"<small class="status status-loading">Loading report...</small>"#.to_string()
            }
            StatusIndicator::Loaded {
                filename,
                created_time,
            } => format!(
                r#"<small class="status status-loaded">Report loaded: {}</small><br><small class="status status-time">Generated: {}</small>"#,
                escape_html(filename.as_deref().unwrap_or("Unknown")),
                escape_html(created_time.as_deref().unwrap_or("Unknown"))
            ),
            StatusIndicator::Error => {
                r#"<small class="status status-error">Error loading report</small>"#.to_string()
            }
        }
    }
}
