//! Provider abstractions for the language model and slide retrieval
//!
//! This module provides trait-based abstractions that allow switching between
//! a local (Ollama) and a hosted (OpenAI-compatible) chat backend.

pub mod llm;
pub mod local;
pub mod ollama;
pub mod openai;
pub mod retrieval;
pub mod stream;

pub use llm::LlmProvider;
pub use local::SlideRetriever;
pub use ollama::OllamaChat;
pub use openai::OpenAiChat;
pub use retrieval::RetrievalProvider;

use std::sync::Arc;

use crate::config::{CoachConfig, LlmBackend};
use crate::error::Result;

/// Build the chat provider selected by `config.backend`
pub fn build_llm(config: &CoachConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.backend {
        LlmBackend::Ollama => Arc::new(OllamaChat::new(&config.ollama)?),
        LlmBackend::OpenAi => Arc::new(OpenAiChat::new(&config.openai)?),
    };

    tracing::info!("Using {} backend with model {}", provider.name(), provider.model());
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_llm_selects_backend() {
        let config = CoachConfig::default();
        let provider = build_llm(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "phi3");

        let mut config = CoachConfig::default();
        config.backend = LlmBackend::OpenAi;
        config.openai.api_key = Some("sk-test".to_string());
        let provider = build_llm(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
