//! Tool abstraction used by the agent loop.
//!
//! Remote MCP tools are wrapped into [`Tool`] and collected into a
//! [`ToolRegistry`], which guards every call with a timeout and panic
//! recovery.

use crate::llm::ToolDefinition;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Result of executing a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
        }
    }
}

/// Trait for agent tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// Get the JSON schema for parameters
    fn parameters(&self) -> Value;

    /// Execute the tool with given parameters
    async fn execute(&self, params: Value) -> Result<ToolResult>;

    /// Convert to a definition the LLM understands
    fn to_definition(&self) -> ToolDefinition {
        let mut parameters = self.parameters();
        // OpenAI rejects function schemas without an object type
        if !parameters.is_object() {
            parameters = serde_json::json!({"type": "object", "properties": {}});
        }
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters,
        }
    }
}

/// Registry of available tools
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    tool_timeout_secs: u64,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT_SECS)
    }
}

/// Default per-call timeout
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

impl ToolRegistry {
    pub fn new(tool_timeout_secs: u64) -> Self {
        Self {
            tools: BTreeMap::new(),
            tool_timeout_secs,
        }
    }

    /// Register a tool; a later tool with the same name replaces the earlier one
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!("Tool '{}' registered twice, keeping the latest", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool definitions for the LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool by name. Failures come back as error results, never as `Err`.
    pub async fn execute(&self, name: &str, params: Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolResult::error(format!("Unknown tool: {}", name));
        };

        let timeout_duration = Duration::from_secs(self.tool_timeout_secs);

        // Wrap tool execution with timeout + panic recovery
        match timeout(
            timeout_duration,
            AssertUnwindSafe(tool.execute(params)).catch_unwind(),
        )
        .await
        {
            Ok(Ok(Ok(result))) => result,
            Ok(Ok(Err(e))) => {
                tracing::warn!("Tool '{}' failed: {:#}", name, e);
                ToolResult::error(format!("Tool '{}' failed: {}", name, e))
            }
            Ok(Err(panic_info)) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                tracing::error!("Tool '{}' panicked: {}", name, panic_msg);
                ToolResult::error(format!("Tool '{}' crashed: {}", name, panic_msg))
            }
            Err(_) => ToolResult::error(format!(
                "Tool '{}' timed out after {} seconds",
                name, self.tool_timeout_secs
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the text argument"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(&self, params: Value) -> Result<ToolResult> {
            let text = params.get("text").and_then(Value::as_str).unwrap_or("");
            Ok(ToolResult::success(text))
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl Tool for PanickingTool {
        fn name(&self) -> &str {
            "boom"
        }

        fn description(&self) -> &str {
            ""
        }

        fn parameters(&self) -> Value {
            Value::Null
        }

        async fn execute(&self, _params: Value) -> Result<ToolResult> {
            panic!("kaboom");
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            ""
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, _params: Value) -> Result<ToolResult> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ToolResult::success("late"))
        }
    }

    #[tokio::test]
    async fn test_execute_known_tool() {
        let mut registry = ToolRegistry::default();
        registry.register(Arc::new(EchoTool));

        let result = registry.execute("echo", json!({"text": "hi"})).await;
        assert_eq!(result, ToolResult::success("hi"));
        assert_eq!(registry.names(), vec!["echo".to_string()]);
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::default();
        let result = registry.execute("missing", json!({})).await;
        assert!(!result.success);
        assert!(result.output.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_panic_becomes_error_result() {
        let mut registry = ToolRegistry::default();
        registry.register(Arc::new(PanickingTool));

        let result = registry.execute("boom", json!({})).await;
        assert!(!result.success);
        assert!(result.output.contains("kaboom"));
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_result() {
        let mut registry = ToolRegistry::new(0);
        registry.register(Arc::new(SlowTool));

        let result = registry.execute("slow", json!({})).await;
        assert!(!result.success);
        assert!(result.output.contains("timed out"));
    }

    #[test]
    fn test_definition_defaults_non_object_schema() {
        let def = PanickingTool.to_definition();
        assert_eq!(def.name, "boom");
        assert_eq!(def.parameters["type"], "object");
    }
}
