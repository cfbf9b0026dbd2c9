//! OpenAI chat completions provider
//!
//! Calls `{base_url}/chat/completions` with `stream: true` and folds the
//! server-sent events into one reply. Any OpenAI-compatible server works.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OpenAiConfig;
use crate::error::{Error, Result};
use crate::types::Message;

use super::llm::LlmProvider;
use super::stream::{accumulate, Fragment};

/// OpenAI API client
pub struct OpenAiChat {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChat {
    /// Create a new client; requires an API key in config or `OPENAI_API_KEY`
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            Error::Config("OpenAI backend selected but no API key is configured".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config: config.clone(),
        })
    }
}

/// Parse one server-sent event line from a streamed completion
pub(crate) fn parse_sse_line(line: &str) -> Result<Fragment> {
    let Some(data) = line.strip_prefix("data:") else {
        // Comments, `event:` and `id:` fields carry no text
        return Ok(Fragment::Empty);
    };
    let data = data.trim();

    if data == "[DONE]" {
        return Ok(Fragment::Done(String::new()));
    }

    let chunk: CompletionChunk = serde_json::from_str(data)
        .map_err(|e| Error::llm(format!("Malformed completion chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(Error::llm(format!("Chat completion stream error: {}", message)));
    }

    let text: String = chunk
        .choices
        .into_iter()
        .take(1)
        .filter_map(|c| c.delta.content)
        .collect();

    Ok(if text.is_empty() { Fragment::Empty } else { Fragment::Text(text) })
}

#[async_trait]
impl LlmProvider for OpenAiChat {
    async fn chat(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            stream: true,
            temperature: self.config.temperature,
        };

        tracing::debug!("OpenAI chat: {} messages to {}", messages.len(), self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Chat completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "Chat completion failed: HTTP {} - {}",
                status, body
            )));
        }

        accumulate(response.bytes_stream(), parse_sse_line).await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_line() {
        let line = r#"data: {"id":"c1","choices":[{"index":0,"delta":{"content":"Grade"}}]}"#;
        assert_eq!(parse_sse_line(line).unwrap(), Fragment::Text("Grade".to_string()));

        let role_only = r#"data: {"id":"c1","choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_sse_line(role_only).unwrap(), Fragment::Empty);

        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), Fragment::Done(String::new()));
        assert_eq!(parse_sse_line(": keep-alive").unwrap(), Fragment::Empty);
    }

    #[test]
    fn test_parse_sse_line_malformed() {
        assert!(matches!(parse_sse_line("data: {not json"), Err(Error::Llm(_))));
    }

    #[test]
    fn test_parse_sse_error_event() {
        let line = r#"data: {"error":{"message":"The server is overloaded","type":"server_error"}}"#;
        let err = parse_sse_line(line).unwrap_err();
        assert!(matches!(err, Error::Llm(msg) if msg.contains("overloaded")));
    }

    #[tokio::test]
    async fn test_error_event_mid_stream_discards_partial_reply() {
        let body = concat!(
            r#"data: {"choices":[{"index":0,"delta":{"content":"Partial"}}]}"#,
            "\n\n",
            r#"data: {"error":{"message":"The server is overloaded"}}"#,
            "\n\n",
        );
        let chunks: Vec<std::result::Result<&[u8], String>> = vec![Ok(body.as_bytes())];
        let err = accumulate(futures_util::stream::iter(chunks), parse_sse_line)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(msg) if msg.contains("overloaded")));
    }

    #[tokio::test]
    async fn test_stream_without_done_marker_fails() {
        let body = concat!(
            r#"data: {"choices":[{"index":0,"delta":{"content":"Cut"}}]}"#,
            "\n\n",
        );
        let chunks: Vec<std::result::Result<&[u8], String>> = vec![Ok(body.as_bytes())];
        let err = accumulate(futures_util::stream::iter(chunks), parse_sse_line)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(msg) if msg.contains("ended before")));
    }

    #[test]
    fn test_missing_api_key() {
        let config = OpenAiConfig {
            api_key: None,
            ..OpenAiConfig::default()
        };
        assert!(matches!(OpenAiChat::new(&config), Err(Error::Config(_))));
    }
}
