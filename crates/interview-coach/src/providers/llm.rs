//! Language-model provider trait for chat replies

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Message;

/// Trait for chat-style language models
///
/// Implementations stream the reply from the backend and resolve once the
/// concatenated text is complete; partial replies are never surfaced.
///
/// Implementations:
/// - `OllamaChat`: Local Ollama server (`/api/chat`)
/// - `OpenAiChat`: OpenAI chat completions or a compatible server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send an ordered message list and wait for the full reply
    async fn chat(&self, messages: &[Message]) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
