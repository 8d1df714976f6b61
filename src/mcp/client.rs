//! MCP client for connecting to external MCP servers (async).

use super::transport::StdioTransport;
use super::types::{
    ConnectionStatus, McpToolDef, McpToolResult, ServerCapabilities, PROTOCOL_VERSION,
};
use crate::config::{McpConfig, McpServer, McpTransportKind};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Information about a connected MCP server
pub struct McpServerConnection {
    /// Server configuration
    pub config: McpServer,
    /// Connection status
    pub status: ConnectionStatus,
    /// Transport (if connected)
    transport: Option<Arc<StdioTransport>>,
    /// Discovered tools
    pub tools: Vec<McpToolDef>,
}

impl McpServerConnection {
    /// Create a new disconnected connection
    pub fn new(config: McpServer) -> Self {
        Self {
            config,
            status: ConnectionStatus::Disconnected,
            transport: None,
            tools: Vec::new(),
        }
    }
}

/// Manages connections to the configured MCP servers (async)
pub struct McpServerManager {
    /// Server connections by name
    connections: RwLock<BTreeMap<String, McpServerConnection>>,
    /// Working directory for spawned processes (inherits ours when None)
    working_dir: Option<PathBuf>,
}

impl Default for McpServerManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl McpServerManager {
    /// Create a new manager
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self {
            connections: RwLock::new(BTreeMap::new()),
            working_dir,
        }
    }

    /// Load server configurations, skipping disabled servers
    pub async fn load_config(&self, config: &McpConfig) {
        let mut connections = self.connections.write().await;
        for (id, server_config) in &config.servers {
            if server_config.enabled && !connections.contains_key(id) {
                connections.insert(id.clone(), McpServerConnection::new(server_config.clone()));
            }
        }
    }

    /// Get list of configured server IDs
    pub async fn server_ids(&self) -> Vec<String> {
        self.connections.read().await.keys().cloned().collect()
    }

    /// Get connection status for a server
    pub async fn status(&self, server_id: &str) -> Option<ConnectionStatus> {
        self.connections
            .read()
            .await
            .get(server_id)
            .map(|c| c.status.clone())
    }

    /// Get all tools from a connected server
    pub async fn tools(&self, server_id: &str) -> Vec<McpToolDef> {
        self.connections
            .read()
            .await
            .get(server_id)
            .map(|c| c.tools.clone())
            .unwrap_or_default()
    }

    /// Connect to every configured server
    pub async fn connect_all(&self) -> Result<()> {
        let ids = self.server_ids().await;
        if ids.is_empty() {
            anyhow::bail!("No MCP servers are configured");
        }
        for id in ids {
            if !self.is_connected(&id).await {
                self.connect(&id).await?;
            }
        }
        Ok(())
    }

    async fn set_status(&self, server_id: &str, status: ConnectionStatus) {
        let mut connections = self.connections.write().await;
        if let Some(conn) = connections.get_mut(server_id) {
            conn.status = status;
        }
    }

    /// Connect to a server (async)
    pub async fn connect(&self, server_id: &str) -> Result<()> {
        let config = {
            let connections = self.connections.read().await;
            connections
                .get(server_id)
                .map(|c| c.config.clone())
                .ok_or_else(|| anyhow::anyhow!("Unknown server: {}", server_id))?
        };

        if config.transport != McpTransportKind::Stdio {
            let message = format!(
                "Server '{}' uses an unsupported transport: {:?}",
                server_id, config.transport
            );
            self.set_status(server_id, ConnectionStatus::Failed(message.clone()))
                .await;
            anyhow::bail!(message);
        }

        self.set_status(server_id, ConnectionStatus::Connecting)
            .await;

        let transport = match StdioTransport::spawn(
            &config.command,
            &config.args,
            &config.env,
            self.working_dir.as_ref(),
        )
        .await
        {
            Ok(t) => Arc::new(t),
            Err(e) => {
                self.set_status(server_id, ConnectionStatus::Failed(e.to_string()))
                    .await;
                return Err(e);
            }
        };

        let init_result = transport
            .request(
                "initialize",
                Some(json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "geochat",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                })),
            )
            .await;

        let capabilities: ServerCapabilities = match init_result {
            Ok(result) => {
                if let Err(e) = transport.notify("notifications/initialized", None).await {
                    tracing::warn!("Failed to send initialized notification: {}", e);
                }

                result
                    .get("capabilities")
                    .cloned()
                    .and_then(|c| serde_json::from_value(c).ok())
                    .unwrap_or_default()
            }
            Err(e) => {
                self.set_status(server_id, ConnectionStatus::Failed(e.to_string()))
                    .await;
                let _ = transport.kill().await;
                return Err(e).with_context(|| format!("Failed to initialize '{}'", server_id));
            }
        };

        let tools: Vec<McpToolDef> = if capabilities.tools.is_some() {
            match transport.request("tools/list", None).await {
                Ok(result) => result
                    .get("tools")
                    .and_then(|t| serde_json::from_value(t.clone()).ok())
                    .unwrap_or_default(),
                Err(e) => {
                    tracing::warn!("Failed to list tools: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        {
            let mut connections = self.connections.write().await;
            if let Some(conn) = connections.get_mut(server_id) {
                conn.transport = Some(transport);
                conn.tools = tools.clone();
                conn.status = ConnectionStatus::Connected;
            }
        }

        tracing::info!(
            "Connected to MCP server '{}' with tools: {:?}",
            server_id,
            tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
        );
        Ok(())
    }

    /// Disconnect from a server (async)
    pub async fn disconnect(&self, server_id: &str) -> Result<()> {
        let mut connections = self.connections.write().await;
        if let Some(conn) = connections.get_mut(server_id) {
            if let Some(transport) = conn.transport.take() {
                if let Err(e) = transport.kill().await {
                    tracing::debug!("Kill on disconnect failed for '{}': {}", server_id, e);
                }
            }
            conn.status = ConnectionStatus::Disconnected;
            conn.tools.clear();
            tracing::info!("Disconnected from MCP server: {}", server_id);
        }
        Ok(())
    }

    /// Call a tool on a server (async)
    pub async fn call_tool(
        &self,
        server_id: &str,
        tool_name: &str,
        arguments: Value,
    ) -> Result<McpToolResult> {
        // Clone the transport out so the call runs without the lock held
        let transport = {
            let connections = self.connections.read().await;
            let conn = connections
                .get(server_id)
                .ok_or_else(|| anyhow::anyhow!("Unknown server: {}", server_id))?;

            if !conn.status.is_connected() {
                return Err(anyhow::anyhow!("Server not connected: {}", server_id));
            }

            conn.transport
                .clone()
                .ok_or_else(|| anyhow::anyhow!("No transport for server: {}", server_id))?
        };

        let result = transport
            .request(
                "tools/call",
                Some(json!({
                    "name": tool_name,
                    "arguments": arguments
                })),
            )
            .await
            .with_context(|| format!("Failed to call tool: {}", tool_name))?;

        serde_json::from_value(result).context("Failed to parse tool result")
    }

    /// Check if a server is connected
    pub async fn is_connected(&self, server_id: &str) -> bool {
        self.connections
            .read()
            .await
            .get(server_id)
            .map(|c| c.status.is_connected())
            .unwrap_or(false)
    }

    /// Disconnect all servers (async) - for cleanup
    pub async fn disconnect_all(&self) {
        for id in self.server_ids().await {
            let _ = self.disconnect(&id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(servers: Vec<(&str, McpServer)>) -> McpConfig {
        McpConfig {
            validate_paths: false,
            tool_timeout_secs: 5,
            servers: servers
                .into_iter()
                .map(|(id, s)| (id.to_string(), s))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_load_config_skips_disabled() {
        let manager = McpServerManager::default();
        let disabled = McpServer {
            enabled: false,
            ..McpServer::default()
        };
        manager
            .load_config(&config_with(vec![
                ("geo", McpServer::default()),
                ("off", disabled),
            ]))
            .await;

        assert_eq!(manager.server_ids().await, vec!["geo".to_string()]);
        assert_eq!(
            manager.status("geo").await,
            Some(ConnectionStatus::Disconnected)
        );
    }

    #[tokio::test]
    async fn test_connect_rejects_non_stdio_transport() {
        let manager = McpServerManager::default();
        let sse = McpServer {
            command: "unused".to_string(),
            args: vec![],
            transport: McpTransportKind::Sse,
            env: HashMap::new(),
            enabled: true,
        };
        manager.load_config(&config_with(vec![("remote", sse)])).await;

        let err = manager.connect("remote").await.unwrap_err();
        assert!(err.to_string().contains("unsupported transport"));
        assert!(matches!(
            manager.status("remote").await,
            Some(ConnectionStatus::Failed(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_all_without_servers_fails() {
        let manager = McpServerManager::default();
        assert!(manager.connect_all().await.is_err());
    }

    #[tokio::test]
    async fn test_call_tool_on_disconnected_server() {
        let manager = McpServerManager::default();
        manager
            .load_config(&config_with(vec![("geo", McpServer::default())]))
            .await;

        let err = manager
            .call_tool("geo", "user_login", json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Server not connected"));
    }
}
