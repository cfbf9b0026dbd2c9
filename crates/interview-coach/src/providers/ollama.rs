//! Ollama chat provider
//!
//! Talks to `/api/chat` with `stream: true` and folds the NDJSON records into
//! one reply.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OllamaConfig;
use crate::error::{Error, Result};
use crate::types::Message;

use super::llm::LlmProvider;
use super::stream::{accumulate, Fragment};

/// Ollama API client
pub struct OllamaChat {
    /// HTTP client
    client: Client,
    /// Configuration
    config: OllamaConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

impl OllamaChat {
    /// Create a new Ollama chat client
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

/// Parse one NDJSON record from `/api/chat`
pub(crate) fn parse_chat_line(line: &str) -> Result<Fragment> {
    let chunk: StreamChunk = serde_json::from_str(line)
        .map_err(|e| Error::llm(format!("Malformed stream record: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(Error::llm(format!("Ollama error: {}", error)));
    }

    let text = chunk.message.map(|m| m.content).unwrap_or_default();
    if chunk.done {
        // The final record may still carry trailing text
        return Ok(Fragment::Done(text));
    }

    Ok(if text.is_empty() { Fragment::Empty } else { Fragment::Text(text) })
}

#[async_trait]
impl LlmProvider for OllamaChat {
    async fn chat(&self, messages: &[Message]) -> Result<String> {
        let url = self.endpoint("/api/chat");
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            stream: true,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        };

        tracing::debug!("Ollama chat: {} messages to {}", messages.len(), self.config.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Chat request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!("Chat failed: HTTP {} - {}", status, body)));
        }

        accumulate(response.bytes_stream(), parse_chat_line).await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.endpoint("/api/tags");

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_line() {
        let line = r#"{"model":"phi3","message":{"role":"assistant","content":"Hel"},"done":false}"#;
        assert_eq!(parse_chat_line(line).unwrap(), Fragment::Text("Hel".to_string()));

        let done = r#"{"model":"phi3","message":{"role":"assistant","content":""},"done":true}"#;
        assert_eq!(parse_chat_line(done).unwrap(), Fragment::Done(String::new()));

        let last = r#"{"message":{"role":"assistant","content":"lo."},"done":true}"#;
        assert_eq!(parse_chat_line(last).unwrap(), Fragment::Done("lo.".to_string()));
    }

    #[tokio::test]
    async fn test_stream_without_done_record_fails() {
        let body = concat!(
            r#"{"message":{"role":"assistant","content":"Half an ans"},"done":false}"#,
            "\n"
        );
        let chunks: Vec<std::result::Result<&[u8], String>> = vec![Ok(body.as_bytes())];
        let err = accumulate(futures_util::stream::iter(chunks), parse_chat_line)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = OllamaConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..OllamaConfig::default()
        };
        let client = OllamaChat::new(&config).unwrap();
        assert_eq!(client.endpoint("/api/chat"), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_parse_chat_line_error_record() {
        let err = parse_chat_line(r#"{"error":"model 'phi9' not found"}"#).unwrap_err();
        assert!(matches!(err, Error::Llm(msg) if msg.contains("phi9")));
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![Message::system("ctx"), Message::user("hi")];
        let request = ChatRequest {
            model: "phi3",
            messages: &messages,
            stream: true,
            options: ChatOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["stream"], true);
    }
}
