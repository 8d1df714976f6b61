//! MCP (Model Context Protocol) client.
//!
//! Connects to the configured tool servers over stdio and exposes their
//! tools to the agent.

pub mod client;
pub mod transport;
pub mod types;
pub mod wrapper;

pub use client::McpServerManager;
pub use types::{ConnectionStatus, McpToolDef, McpToolResult};
pub use wrapper::{wrap_server_tools, McpToolWrapper};
