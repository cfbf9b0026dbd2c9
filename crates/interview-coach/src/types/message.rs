//! Chat messages and transcripts

use serde::{Deserialize, Serialize};

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat message
///
/// Serialized as `{"role": "...", "content": "..."}`, which is also the
/// structured format stored in the conversations table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    System(String),
    User(String),
    Assistant(String),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System(_) => Role::System,
            Message::User(_) => Role::User,
            Message::Assistant(_) => Role::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System(c) | Message::User(c) | Message::Assistant(c) => c,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Message::System(_))
    }
}

/// Ordered sequence of chat messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, message: Message) {
        self.0.push(message);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    /// Messages a user may see: everything except system messages
    pub fn visible(&self) -> impl Iterator<Item = &Message> {
        self.0.iter().filter(|m| !m.is_system())
    }

    /// Copy of the transcript with all system messages removed
    pub fn without_system(&self) -> Transcript {
        Transcript(self.visible().cloned().collect())
    }

    /// Texts of all user-authored messages, in order
    pub fn user_questions(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|m| match m {
                Message::User(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// First user message, truncated to `max_chars` with a trailing ellipsis
    pub fn preview(&self, max_chars: usize) -> String {
        let first = self
            .0
            .iter()
            .find_map(|m| match m {
                Message::User(text) => Some(text.as_str()),
                _ => None,
            })
            .unwrap_or("No user message");

        if first.chars().count() > max_chars {
            let truncated: String = first.chars().take(max_chars).collect();
            format!("{}...", truncated)
        } else {
            first.to_string()
        }
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self(messages)
    }
}

impl FromIterator<Message> for Transcript {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
