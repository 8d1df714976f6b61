//! Tool-calling agent loop.
//!
//! One invocation alternates between the LLM and the tool registry until the
//! model answers in plain text or the iteration limit is hit.

use super::memory::MemoryCheckpoint;
use super::tools::ToolRegistry;
use crate::llm::{LlmProvider, LlmResponse, Message, Role, TokenUsage};
use anyhow::Result;
use std::sync::Arc;

/// Default number of LLM round trips per invocation
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Appended when the loop stops without a plain-text answer
pub const MAX_STEPS_MESSAGE: &str =
    "I've reached the maximum number of steps. Here's what I've done so far. Let me know if you'd like me to continue.";

/// Longest tool output kept in the call log
const LOG_PREVIEW_CHARS: usize = 200;

/// Log entry for a tool call made during an invocation
#[derive(Debug, Clone)]
pub struct ToolCallLog {
    pub tool: String,
    pub args: serde_json::Value,
    pub result_preview: String,
    pub success: bool,
}

/// Outcome of one agent invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Input messages followed by everything the loop produced, in order
    pub messages: Vec<Message>,
    pub tool_call_log: Vec<ToolCallLog>,
    pub usage: TokenUsage,
    pub hit_iteration_limit: bool,
}

impl Invocation {
    /// Last assistant-authored message, if any
    pub fn final_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }
}

/// Agent bound to an LLM, a tool set and optional thread memory
pub struct ToolAgent {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    memory: Option<Arc<MemoryCheckpoint>>,
    max_iterations: usize,
}

impl ToolAgent {
    pub fn new(llm: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            llm,
            tools,
            memory: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_memory(mut self, memory: Arc<MemoryCheckpoint>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn memory(&self) -> Option<&Arc<MemoryCheckpoint>> {
        self.memory.as_ref()
    }

    /// Run one invocation on `thread_id`.
    ///
    /// System messages from `input` go first, then the thread's history, then
    /// the rest of `input`. The thread is only updated when the invocation
    /// succeeds.
    pub async fn invoke(&self, input: Vec<Message>, thread_id: &str) -> Result<Invocation> {
        let history = match &self.memory {
            Some(memory) => memory.history(thread_id).await,
            None => Vec::new(),
        };

        let (system, rest): (Vec<Message>, Vec<Message>) =
            input.iter().cloned().partition(|m| m.role == Role::System);
        let mut context: Vec<Message> = system;
        context.extend(history);
        context.extend(rest);

        let mut transcript = input;
        let tool_definitions = self.tools.definitions();
        let mut tool_call_log = Vec::new();
        let mut usage = TokenUsage::default();
        let mut iterations = 0;
        let mut hit_iteration_limit = false;

        tracing::debug!(
            "Invoking agent on thread '{}' with {} context messages",
            thread_id,
            context.len()
        );

        loop {
            if iterations >= self.max_iterations {
                tracing::warn!(
                    "Agent hit the iteration limit ({}) on thread '{}'",
                    self.max_iterations,
                    thread_id
                );
                let message = Message::assistant(MAX_STEPS_MESSAGE);
                context.push(message.clone());
                transcript.push(message);
                hit_iteration_limit = true;
                break;
            }

            let response = self
                .llm
                .chat(&context, Some(&tool_definitions))
                .await?;
            iterations += 1;

            if let Some(u) = response.usage() {
                usage.input_tokens += u.input_tokens;
                usage.output_tokens += u.output_tokens;
                usage.total_tokens += u.total_tokens;
            }

            let calls = response.tool_calls().to_vec();
            if calls.is_empty() {
                let text = match response {
                    LlmResponse::Text { text, .. } => text,
                    other => other.text().unwrap_or_default().to_string(),
                };
                let message = Message::assistant(text);
                context.push(message.clone());
                transcript.push(message);
                break;
            }

            let request = Message::assistant_tool_calls(response.text(), &calls);
            context.push(request.clone());
            transcript.push(request);

            for call in &calls {
                tracing::debug!("Tool call {} -> {}", call.name, call.arguments);
                let result = self.tools.execute(&call.name, call.arguments.clone()).await;
                if !result.success {
                    tracing::warn!("Tool '{}' returned an error: {}", call.name, result.output);
                }

                tool_call_log.push(ToolCallLog {
                    tool: call.name.clone(),
                    args: call.arguments.clone(),
                    result_preview: result.output.chars().take(LOG_PREVIEW_CHARS).collect(),
                    success: result.success,
                });

                let message = Message::tool_result(&call.id, result.output);
                context.push(message.clone());
                transcript.push(message);
            }
        }

        if let Some(memory) = &self.memory {
            memory.append_turn(thread_id, &transcript).await;
        }

        tracing::info!(
            "Agent finished on thread '{}' after {} LLM calls and {} tool calls",
            thread_id,
            iterations,
            tool_call_log.len()
        );

        Ok(Invocation {
            messages: transcript,
            tool_call_log,
            usage,
            hit_iteration_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::{Tool, ToolResult};
    use crate::llm::{ToolCall, ToolDefinition};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Replays canned responses and records what it was sent
    struct Scripted {
        responses: Mutex<Vec<LlmResponse>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl Scripted {
        fn new(mut responses: Vec<LlmResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(
            &self,
            messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<LlmResponse> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }
    }

    struct Login;

    #[async_trait]
    impl Tool for Login {
        fn name(&self) -> &str {
            "user_login"
        }

        fn description(&self) -> &str {
            "Authenticate"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, _params: Value) -> Result<ToolResult> {
            Ok(ToolResult::success("logged in"))
        }
    }

    fn login_call() -> LlmResponse {
        LlmResponse::ToolCalls {
            calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: "user_login".to_string(),
                arguments: json!({}),
            }],
            usage: None,
        }
    }

    fn text(t: &str) -> LlmResponse {
        LlmResponse::Text {
            text: t.to_string(),
            usage: None,
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::default();
        registry.register(Arc::new(Login));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let llm = Arc::new(Scripted::new(vec![login_call(), text("Finished")]));
        let agent = ToolAgent::new(llm.clone(), registry());

        let result = agent
            .invoke(vec![Message::system("sys"), Message::user("go")], "t")
            .await
            .unwrap();

        // system, user, tool request, tool result, final answer
        assert_eq!(result.messages.len(), 5);
        assert_eq!(result.messages[3].role, Role::Tool);
        assert_eq!(result.messages[3].text(), "logged in");
        assert_eq!(result.final_message().map(|m| m.text()), Some("Finished".to_string()));
        assert_eq!(result.tool_call_log.len(), 1);
        assert!(result.tool_call_log[0].success);
        assert!(!result.hit_iteration_limit);
    }

    #[tokio::test]
    async fn test_iteration_limit_adds_assistant_message() {
        let llm = Arc::new(Scripted::new(vec![login_call(), login_call()]));
        let agent = ToolAgent::new(llm, registry()).with_max_iterations(2);

        let result = agent.invoke(vec![Message::user("loop")], "t").await.unwrap();
        assert!(result.hit_iteration_limit);
        assert_eq!(
            result.final_message().map(|m| m.text()),
            Some(MAX_STEPS_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_memory_feeds_next_invocation() {
        let llm = Arc::new(Scripted::new(vec![text("first"), text("second")]));
        let memory = Arc::new(MemoryCheckpoint::new());
        let agent = ToolAgent::new(llm.clone(), registry()).with_memory(memory.clone());

        agent
            .invoke(vec![Message::system("sys"), Message::user("one")], "t1")
            .await
            .unwrap();
        agent
            .invoke(vec![Message::system("sys"), Message::user("two")], "t1")
            .await
            .unwrap();

        let seen = llm.seen.lock().unwrap();
        let second = &seen[1];
        // system, remembered user + answer, new user
        assert_eq!(second.len(), 4);
        assert_eq!(second[0].role, Role::System);
        assert_eq!(second[1].text(), "one");
        assert_eq!(second[2].text(), "first");
        assert_eq!(second[3].text(), "two");
        drop(seen);

        assert_eq!(memory.turn_count("t1").await, 2);
    }

    #[tokio::test]
    async fn test_llm_error_leaves_memory_untouched() {
        let llm = Arc::new(Scripted::new(vec![]));
        let memory = Arc::new(MemoryCheckpoint::new());
        let agent = ToolAgent::new(llm, registry()).with_memory(memory.clone());

        assert!(agent.invoke(vec![Message::user("hi")], "t").await.is_err());
        assert_eq!(memory.turn_count("t").await, 0);
    }
}
