//! Chat session over the remote tool server

pub mod client;
mod error;
pub mod handle;
pub mod prompt;

pub use client::{
    extract_final_response, AnalysisOutcome, ResolvedReport, SessionClient, COMPLETED_FALLBACK,
};
pub use error::SessionError;
pub use handle::{extract_json_block, extract_json_field, extract_report_handle};
