//! Tool-calling agent with thread memory

mod chat;
mod memory;
mod tools;

pub use chat::{Invocation, ToolAgent, ToolCallLog, DEFAULT_MAX_ITERATIONS, MAX_STEPS_MESSAGE};
pub use memory::{MemoryCheckpoint, DEFAULT_MAX_HISTORY_MESSAGES};
pub use tools::{Tool, ToolRegistry, ToolResult, DEFAULT_TOOL_TIMEOUT_SECS};
