//! LLM provider abstraction

use crate::config::LlmConfig;

mod error;
mod openai;
mod types;

pub use error::LlmError;
pub use openai::{OpenAiProvider, OPENAI_API_KEY_VAR};
pub use types::*;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Send a chat completion request (non-streaming)
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse>;
}

/// Create the configured chat model
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new()?
        .with_model(&config.model)
        .with_max_tokens(config.max_tokens)
        .with_temperature(config.temperature);
    tracing::debug!(
        "Using {} model {} (temperature {})",
        provider.name(),
        config.model,
        config.temperature
    );
    Ok(Box::new(provider))
}
