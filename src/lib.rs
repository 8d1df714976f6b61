//! geochat: chat front-end for geospatial analysis tools
//!
//! This library provides:
//! - A stdio MCP client that spawns the analysis tool server
//! - A tool-calling agent with thread-keyed conversation memory
//! - Report handle extraction and resolution into markdown reports
//! - Markdown report rendering for the web page
//! - An HTTP server with an embedded chat page, plus a terminal chat

pub mod agent;
pub mod config;
pub mod llm;
pub mod mcp;
pub mod report;
pub mod session;
pub mod transport;
pub mod ui;

pub use config::Config;
pub use session::SessionClient;

/// Version string with the build suffix (`-dev.<hash>` outside tagged releases)
pub fn version() -> String {
    format!(
        "{}{}",
        env!("CARGO_PKG_VERSION"),
        env!("GEOCHAT_VERSION_SUFFIX")
    )
}
