//! MCP stdio handshake and tool calls against a scripted shell server

#![cfg(unix)]

mod common;

use common::*;
use geochat::config::{Config, McpConfig, McpServer};
use geochat::mcp::{ConnectionStatus, McpServerManager};
use geochat::session::SessionClient;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Answers initialize, tools/list and one tools/call in order. Before the
/// call result it sends a log notification and a ping that reuses the call's id.
const FAKE_SERVER: &str = r#"#!/bin/sh
read line
echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"fake","version":"0.1"}}}'
read line
read line
echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"optimize_sales_territories","description":"Partition a city into territories","inputSchema":{"type":"object","properties":{"city_name":{"type":"string"}}}}]}}'
read line
echo 'server log line'
echo '{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info"}}'
echo '{"jsonrpc":"2.0","id":3,"method":"ping"}'
echo '{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"Created 6 territories. Report Data Handle: `rpt_fake_1`"}]}}'
read line
"#;

fn fake_server_config(dir: &Path) -> McpConfig {
    let script = dir.join("fake_server.sh");
    std::fs::write(&script, FAKE_SERVER).unwrap();

    let mut servers = BTreeMap::new();
    servers.insert(
        "fake".to_string(),
        McpServer {
            command: "/bin/sh".to_string(),
            args: vec![script.to_string_lossy().into_owned()],
            env: Default::default(),
            ..McpServer::default()
        },
    );
    McpConfig {
        validate_paths: true,
        tool_timeout_secs: 10,
        servers,
    }
}

#[tokio::test]
async fn test_handshake_lists_and_calls_tools() {
    let dir = TempDir::new().unwrap();
    let manager = McpServerManager::default();
    manager.load_config(&fake_server_config(dir.path())).await;

    manager.connect_all().await.unwrap();
    assert_eq!(manager.status("fake").await, Some(ConnectionStatus::Connected));

    let tools = manager.tools("fake").await;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "optimize_sales_territories");

    let result = manager
        .call_tool("fake", "optimize_sales_territories", json!({"city_name": "Jeddah"}))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert!(result.to_text().contains("rpt_fake_1"));

    manager.disconnect_all().await;
    assert!(!manager.is_connected("fake").await);
}

#[tokio::test]
async fn test_session_over_stdio_server() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.mcp = fake_server_config(dir.path());

    let llm = ScriptedLlm::new(vec![
        call("call_1", "optimize_sales_territories", json!({"city_name": "Jeddah"})),
        text("Done.\n\nReport Data Handle: `rpt_fake_1`"),
    ]);
    let session = Arc::new(SessionClient::new(config).with_llm(llm.clone()));

    session.connect().await.unwrap();
    assert_eq!(session.tool_names().await, vec!["optimize_sales_territories"]);

    let outcome = session.analyze_with_handle("Territories for Jeddah", None).await;
    assert_eq!(outcome.handle.as_deref(), Some("rpt_fake_1"));

    // The remote tool output went back to the model
    let seen = llm.seen.lock().unwrap();
    let tool_message = seen[1].last().unwrap();
    assert!(tool_message.text().contains("Created 6 territories"));
    drop(seen);

    session.close().await;
    assert!(!session.is_connected().await);
}

#[tokio::test]
async fn test_server_that_exits_fails_to_connect() {
    let mut servers = BTreeMap::new();
    servers.insert(
        "broken".to_string(),
        McpServer {
            command: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), "exit 0".to_string()],
            env: Default::default(),
            ..McpServer::default()
        },
    );
    let manager = McpServerManager::default();
    manager
        .load_config(&McpConfig {
            validate_paths: false,
            tool_timeout_secs: 5,
            servers,
        })
        .await;

    assert!(manager.connect_all().await.is_err());
    assert!(matches!(
        manager.status("broken").await,
        Some(ConnectionStatus::Failed(_))
    ));
}
