//! Session client: one MCP connection, one agent, thread-keyed memory.

use super::error::SessionError;
use super::handle::{extract_json_block, extract_report_handle};
use super::prompt::{resolve_handle_prompt, GEOSPATIAL_ANALYSIS_PROMPT};
use crate::agent::{Invocation, MemoryCheckpoint, ToolAgent, ToolRegistry};
use crate::config::Config;
use crate::llm::{self, LlmProvider, Message, Role};
use crate::mcp::{wrap_server_tools, McpServerManager};
use crate::report::ReportMetadata;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Returned when an invocation produced no assistant text
pub const COMPLETED_FALLBACK: &str =
    "✅ Analysis completed. Reports have been generated by the server tools.";

/// Result of [`SessionClient::analyze_with_handle`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisOutcome {
    /// Final answer shown to the user
    pub response: String,
    /// Unmodified content of the final agent message; empty on error
    pub raw_content: String,
    /// Report handle announced in `raw_content`
    pub handle: Option<String>,
}

/// Report content obtained for a handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReport {
    pub handle: String,
    pub content: String,
    pub metadata: ReportMetadata,
}

/// Walk messages newest first and return the first non-blank assistant text
pub fn extract_final_response(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .filter(|m| m.role == Role::Assistant)
        .map(Message::text)
        .find(|text| !text.trim().is_empty())
        .unwrap_or_else(|| COMPLETED_FALLBACK.to_string())
}

/// Chat session against the configured tool servers
pub struct SessionClient {
    id: String,
    default_thread_id: String,
    config: Config,
    manager: Arc<McpServerManager>,
    memory: Option<Arc<MemoryCheckpoint>>,
    llm: Option<Arc<dyn LlmProvider>>,
    agent: RwLock<Option<Arc<ToolAgent>>>,
}

impl SessionClient {
    pub fn new(config: Config) -> Self {
        let id = config
            .session
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string()[..8].to_string());
        let default_thread_id = config
            .session
            .thread_id
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("{}_thread", id));
        let memory = config
            .session
            .memory
            .then(|| {
                Arc::new(MemoryCheckpoint::with_max_messages(
                    config.session.max_history_messages,
                ))
            });

        tracing::debug!(
            "Session {} created (thread {}, memory {})",
            id,
            default_thread_id,
            memory.is_some()
        );

        Self {
            id,
            default_thread_id,
            config,
            manager: Arc::new(McpServerManager::default()),
            memory,
            llm: None,
            agent: RwLock::new(None),
        }
    }

    /// Use this chat model instead of the configured one
    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn default_thread_id(&self) -> &str {
        &self.default_thread_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn memory(&self) -> Option<&Arc<MemoryCheckpoint>> {
        self.memory.as_ref()
    }

    pub fn memory_enabled(&self) -> bool {
        self.memory.is_some()
    }

    /// Completed invocations recorded for a thread (0 without memory)
    pub async fn turn_count(&self, thread_id: &str) -> usize {
        match &self.memory {
            Some(memory) => memory.turn_count(thread_id).await,
            None => 0,
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.agent.read().await.is_some()
    }

    /// Names of the tools the agent can call; empty before connecting
    pub async fn tool_names(&self) -> Vec<String> {
        self.agent
            .read()
            .await
            .as_ref()
            .map(|agent| agent.tools().names())
            .unwrap_or_default()
    }

    fn chat_model(&self) -> Result<Arc<dyn LlmProvider>, SessionError> {
        match &self.llm {
            Some(llm) => Ok(llm.clone()),
            None => llm::create_provider(&self.config.llm)
                .map(Arc::from)
                .map_err(|e| SessionError::Connection(e.to_string())),
        }
    }

    /// Spawn the configured servers, discover their tools and bind the agent
    pub async fn connect(&self) -> Result<(), SessionError> {
        if self.is_connected().await {
            return Ok(());
        }

        if self.config.mcp.validate_paths {
            let missing = self.config.validate_paths();
            if !missing.is_empty() {
                let list = missing
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(SessionError::Connection(format!(
                    "Required paths are missing: {}",
                    list
                )));
            }
        }

        // Fail before spawning anything when the model is unavailable
        let llm = self.chat_model()?;

        tracing::info!("Connecting session {} to MCP servers", self.id);
        self.manager.load_config(&self.config.mcp).await;
        if let Err(e) = self.manager.connect_all().await {
            self.manager.disconnect_all().await;
            return Err(SessionError::Connection(format!("{:#}", e)));
        }

        let mut registry = ToolRegistry::new(self.config.mcp.tool_timeout_secs);
        for server_id in self.manager.server_ids().await {
            for tool in wrap_server_tools(
                &server_id,
                self.manager.clone(),
                self.config.mcp.tool_timeout_secs,
            )
            .await
            {
                registry.register(tool);
            }
        }

        if registry.is_empty() {
            self.manager.disconnect_all().await;
            return Err(SessionError::Connection(
                "MCP servers exposed no tools".to_string(),
            ));
        }

        tracing::info!("Available tools: {:?}", registry.names());
        self.bind(llm, registry).await;
        Ok(())
    }

    /// Bind the agent to an already built tool set without spawning servers
    pub async fn attach_tools(&self, registry: ToolRegistry) -> Result<(), SessionError> {
        let llm = self.chat_model()?;
        self.bind(llm, registry).await;
        Ok(())
    }

    async fn bind(&self, llm: Arc<dyn LlmProvider>, registry: ToolRegistry) {
        let mut agent = ToolAgent::new(llm, Arc::new(registry))
            .with_max_iterations(self.config.agent.max_iterations);
        if let Some(memory) = &self.memory {
            agent = agent.with_memory(memory.clone());
        }
        *self.agent.write().await = Some(Arc::new(agent));
    }

    fn resolve_thread<'a>(&'a self, thread_id: Option<&'a str>) -> &'a str {
        thread_id
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(self.default_thread_id.as_str())
    }

    async fn invoke(&self, query: &str, thread_id: &str) -> Result<Invocation, SessionError> {
        // Clone the agent out so the lock is not held across the invocation
        let agent = self
            .agent
            .read()
            .await
            .clone()
            .ok_or(SessionError::NotConnected)?;

        let preview: String = query.chars().take(100).collect();
        tracing::info!("Processing query on thread '{}': {}", thread_id, preview);

        let messages = vec![
            Message::system(GEOSPATIAL_ANALYSIS_PROMPT),
            Message::user(query),
        ];
        let invocation = agent
            .invoke(messages, thread_id)
            .await
            .map_err(|e| SessionError::Invocation(format!("{:#}", e)))?;

        for call in &invocation.tool_call_log {
            tracing::info!(
                "Tool {} ({}) {}: {}",
                call.tool,
                call.args,
                if call.success { "ok" } else { "failed" },
                call.result_preview
            );
        }
        tracing::info!(
            "Thread '{}' used {} input / {} output tokens{}",
            thread_id,
            invocation.usage.input_tokens,
            invocation.usage.output_tokens,
            if invocation.hit_iteration_limit {
                " (iteration limit reached)"
            } else {
                ""
            }
        );
        Ok(invocation)
    }

    fn failure_text(error: &SessionError) -> String {
        match error {
            SessionError::NotConnected => error.to_string(),
            other => format!("Error processing query: {}", other),
        }
    }

    /// Run one analysis and return the final answer. Never empty.
    pub async fn analyze(&self, query: &str, thread_id: Option<&str>) -> String {
        let thread_id = self.resolve_thread(thread_id);
        match self.invoke(query, thread_id).await {
            Ok(invocation) => extract_final_response(&invocation.messages),
            Err(e) => {
                tracing::error!("Analysis failed: {}", e);
                Self::failure_text(&e)
            }
        }
    }

    /// Run one analysis and also report the raw final message and any handle in it
    pub async fn analyze_with_handle(&self, query: &str, thread_id: Option<&str>) -> AnalysisOutcome {
        let thread_id = self.resolve_thread(thread_id);
        match self.invoke(query, thread_id).await {
            Ok(invocation) => {
                let raw_content = invocation
                    .messages
                    .last()
                    .filter(|m| m.role == Role::Assistant)
                    .map(Message::text)
                    .unwrap_or_default();
                let handle = extract_report_handle(&raw_content);
                match &handle {
                    Some(h) => tracing::info!("Found report handle: {}", h),
                    None => tracing::debug!("No report handle in response"),
                }
                AnalysisOutcome {
                    response: extract_final_response(&invocation.messages),
                    raw_content,
                    handle,
                }
            }
            Err(e) => {
                tracing::error!("Analysis failed: {}", e);
                AnalysisOutcome {
                    response: Self::failure_text(&e),
                    raw_content: String::new(),
                    handle: None,
                }
            }
        }
    }

    /// Ask the tools for the report behind `handle` on the same thread
    pub async fn resolve_handle(
        &self,
        handle: &str,
        thread_id: Option<&str>,
    ) -> Result<ResolvedReport, SessionError> {
        let thread_id = self.resolve_thread(thread_id);
        let failed = |reason: String| SessionError::Resolution {
            handle: handle.to_string(),
            reason,
        };

        let invocation = match self.invoke(&resolve_handle_prompt(handle), thread_id).await {
            Ok(invocation) => invocation,
            Err(SessionError::NotConnected) => return Err(SessionError::NotConnected),
            Err(e) => return Err(failed(e.to_string())),
        };

        let reply = invocation
            .final_message()
            .map(Message::text)
            .unwrap_or_default();
        if reply.trim().is_empty() {
            return Err(failed("the tools returned no content".to_string()));
        }

        let (content, metadata) = match extract_json_block(&reply) {
            Some(block) => {
                let content = block
                    .get("content")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_default();
                (content, ReportMetadata::from_json(&block))
            }
            None => (reply, ReportMetadata::default()),
        };

        if content.trim().is_empty() {
            return Err(failed("the report content is empty".to_string()));
        }

        tracing::info!("Resolved report {} ({} bytes)", handle, content.len());
        Ok(ResolvedReport {
            handle: handle.to_string(),
            content,
            metadata,
        })
    }

    /// Disconnect every server and drop the agent. Safe to call repeatedly.
    pub async fn close(&self) {
        self.agent.write().await.take();
        self.manager.disconnect_all().await;
        tracing::info!("Session {} closed", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_final_response_prefers_latest_assistant_text() {
        let messages = vec![
            Message::user("q"),
            Message::assistant("older"),
            Message::assistant("newest"),
            Message::assistant("   "),
        ];
        assert_eq!(extract_final_response(&messages), "newest");
    }

    #[test]
    fn test_extract_final_response_fallback() {
        assert_eq!(extract_final_response(&[]), COMPLETED_FALLBACK);
        assert_eq!(
            extract_final_response(&[Message::user("only a question")]),
            COMPLETED_FALLBACK
        );
    }

    #[test]
    fn test_session_ids() {
        let mut config = Config::default();
        config.session.id = Some("dash_session".to_string());
        let session = SessionClient::new(config);
        assert_eq!(session.id(), "dash_session");
        assert_eq!(session.default_thread_id(), "dash_session_thread");
        assert!(session.memory_enabled());

        let generated = SessionClient::new(Config::default());
        assert_eq!(generated.id().len(), 8);
        assert!(generated.id().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_analyze_without_agent() {
        let session = SessionClient::new(Config::default());
        assert!(!session.is_connected().await);
        let answer = session.analyze("Create territories", None).await;
        assert!(answer.contains("not connected"));

        let outcome = session.analyze_with_handle("Create territories", None).await;
        assert!(outcome.raw_content.is_empty());
        assert_eq!(outcome.handle, None);
        assert!(session.tool_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_connect_reports_missing_paths() {
        let mut config = Config::default();
        config.mcp.validate_paths = true;
        for server in config.mcp.servers.values_mut() {
            server.command = "/definitely/missing/python".to_string();
        }
        let session = SessionClient::new(config);
        let err = session.connect().await.unwrap_err();
        assert!(err.is_connection());
        assert!(err.to_string().contains("Required paths are missing"));
    }
}
