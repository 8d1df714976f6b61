//! Adapts remote MCP tools to the agent's [`Tool`] trait.

use super::client::McpServerManager;
use super::types::McpToolDef;
use crate::agent::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Wraps an MCP tool so the agent can call it
pub struct McpToolWrapper {
    /// Server ID this tool belongs to
    server_id: String,
    /// Tool definition from MCP server
    tool_def: McpToolDef,
    manager: Arc<McpServerManager>,
    timeout_secs: u64,
}

impl McpToolWrapper {
    pub fn new(
        server_id: String,
        tool_def: McpToolDef,
        manager: Arc<McpServerManager>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            server_id,
            tool_def,
            manager,
            timeout_secs,
        }
    }

}

#[async_trait]
impl Tool for McpToolWrapper {
    fn name(&self) -> &str {
        &self.tool_def.name
    }

    fn description(&self) -> &str {
        &self.tool_def.description
    }

    fn parameters(&self) -> Value {
        self.tool_def.input_schema.clone()
    }

    async fn execute(&self, params: Value) -> Result<ToolResult> {
        if !self.manager.is_connected(&self.server_id).await {
            return Ok(ToolResult::error(format!(
                "MCP server '{}' is not connected",
                self.server_id
            )));
        }

        tracing::info!("Calling remote tool '{}' on '{}'", self.tool_def.name, self.server_id);

        match tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.manager
                .call_tool(&self.server_id, &self.tool_def.name, params),
        )
        .await
        {
            Ok(Ok(result)) => {
                if result.is_error {
                    Ok(ToolResult::error(result.to_text()))
                } else {
                    Ok(ToolResult::success(result.to_text()))
                }
            }
            Ok(Err(e)) => Ok(ToolResult::error(format!("MCP call failed: {}", e))),
            Err(_) => Ok(ToolResult::error(format!(
                "MCP call to '{}' on server '{}' timed out after {}s",
                self.tool_def.name, self.server_id, self.timeout_secs
            ))),
        }
    }
}

/// Create tool wrappers for all tools from a connected server
pub async fn wrap_server_tools(
    server_id: &str,
    manager: Arc<McpServerManager>,
    timeout_secs: u64,
) -> Vec<Arc<dyn Tool>> {
    manager
        .tools(server_id)
        .await
        .into_iter()
        .map(|tool_def| {
            Arc::new(McpToolWrapper::new(
                server_id.to_string(),
                tool_def,
                manager.clone(),
                timeout_secs,
            )) as Arc<dyn Tool>
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_disconnected_server_yields_error_result() {
        let manager = Arc::new(McpServerManager::default());
        let def = McpToolDef {
            name: "optimize_sales_territories".to_string(),
            description: "Territory optimisation".to_string(),
            input_schema: json!({"type": "object"}),
        };
        let wrapper = McpToolWrapper::new("geo".to_string(), def, manager, 5);

        assert_eq!(wrapper.name(), "optimize_sales_territories");
        let result = wrapper.execute(json!({})).await.unwrap();
        assert!(!result.success);
        assert!(result.output.contains("not connected"));
    }
}
