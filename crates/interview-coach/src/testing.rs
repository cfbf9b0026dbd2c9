//! Scripted providers for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::providers::{LlmProvider, RetrievalProvider};
use crate::types::{Message, RetrievedSnippet};

/// Chat provider that replays canned replies and records every request
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlm {
    /// `Err` entries are returned as `Error::Llm`
    pub fn new(replies: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Every message list sent so far
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn chat(&self, messages: &[Message]) -> Result<String> {
        self.requests.lock().push(messages.to_vec());
        match self.replies.lock().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(Error::llm(message)),
            None => Err(Error::llm("script exhausted")),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Retrieval provider returning fixed snippets, or always failing
pub struct StaticRetriever {
    snippets: Option<Vec<RetrievedSnippet>>,
}

impl StaticRetriever {
    pub fn with(snippets: Vec<RetrievedSnippet>) -> Self {
        Self {
            snippets: Some(snippets),
        }
    }

    pub fn failing() -> Self {
        Self { snippets: None }
    }
}

#[async_trait]
impl RetrievalProvider for StaticRetriever {
    async fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<RetrievedSnippet>> {
        match &self.snippets {
            Some(snippets) => Ok(snippets.iter().take(k).cloned().collect()),
            None => Err(Error::retrieval("index unavailable")),
        }
    }

    fn name(&self) -> &str {
        "static"
    }
}
