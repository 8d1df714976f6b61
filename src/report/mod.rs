//! Report panel rendering

mod metadata;
mod render;
mod view;

pub use metadata::ReportMetadata;
pub use render::{escape_html, markdown_to_html, metadata_card_html, render_markdown, report_preview};
pub use view::{ReportView, StatusIndicator, DEFAULT_ERROR_SUGGESTIONS};
