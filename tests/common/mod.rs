//! Scripted chat model and fake tools shared by the integration tests

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use geochat::agent::{Tool, ToolRegistry, ToolResult};
use geochat::llm::{LlmProvider, LlmResponse, Message, ToolCall, ToolDefinition};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Replays canned responses in order and records every request
pub struct ScriptedLlm {
    responses: Mutex<Vec<Result<LlmResponse, String>>>,
    pub seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<LlmResponse>) -> Arc<Self> {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(mut responses: Vec<Result<LlmResponse, String>>) -> Arc<Self> {
        responses.reverse();
        Arc::new(Self {
            responses: Mutex::new(responses),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        messages: &[Message],
        _tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse> {
        self.seen.lock().unwrap().push(messages.to_vec());
        match self.responses.lock().unwrap().pop() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("script exhausted")),
        }
    }
}

pub fn text(reply: &str) -> LlmResponse {
    LlmResponse::Text {
        text: reply.to_string(),
        usage: None,
    }
}

pub fn call(id: &str, name: &str, arguments: Value) -> LlmResponse {
    LlmResponse::ToolCalls {
        calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
        usage: None,
    }
}

/// Tool that answers with a fixed string
pub struct FakeTool {
    name: &'static str,
    reply: &'static str,
}

#[async_trait]
impl Tool for FakeTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Fake analysis tool"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value) -> Result<ToolResult> {
        Ok(ToolResult::success(self.reply))
    }
}

/// The four analysis tools the assistant is told about
pub fn analysis_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new(5);
    for (name, reply) in [
        ("user_login", "Authenticated as demo user"),
        ("optimize_sales_territories", "6 territories created, handle rpt_jeddah_001"),
        ("generate_territory_report", "Report rpt_jeddah_001 ready"),
        ("hub_expansion_analyzer", "No hubs requested"),
    ] {
        registry.register(Arc::new(FakeTool { name, reply }));
    }
    registry
}

pub const JEDDAH_ANSWER: &str = "Created 6 balanced territories for restaurants in Jeddah.\n\n\
Report Data Handle: `rpt_jeddah_001`";

pub const JEDDAH_REPORT_REPLY: &str = "Here is the report.\n\n```json\n{\
\"content\": \"# Jeddah Restaurant Territories\\n\\n| Territory | Stores |\\n|---|---|\\n| T1 | 12 |\\n| T2 | 11 |\",\
\"filename\": \"jeddah_restaurants.md\",\
\"city\": \"Jeddah\",\
\"report_type\": \"comprehensive\",\
\"created_time\": \"2025-01-15 10:30\",\
\"file_size\": 2048}\n```";

/// Script for one analysis with a handle followed by its resolution
pub fn jeddah_script() -> Vec<LlmResponse> {
    vec![
        call("call_1", "user_login", json!({})),
        call(
            "call_2",
            "optimize_sales_territories",
            json!({"city_name": "Jeddah", "business_type": "restaurant", "num_territories": 6}),
        ),
        text(JEDDAH_ANSWER),
        call("call_3", "generate_territory_report", json!({"handle": "rpt_jeddah_001"})),
        text(JEDDAH_REPORT_REPLY),
    ]
}
