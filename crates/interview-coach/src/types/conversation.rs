//! Persisted conversation types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::Transcript;

/// Which decoder recognized a stored transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptFormat {
    /// JSON array of `{"role", "content"}` objects
    Structured,
    /// Line-oriented `role: content` text
    Legacy,
}

/// A transcript read back from the conversations table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConversation {
    /// Row id
    pub id: i64,
    /// User identity
    pub user: String,
    /// When the conversation was saved
    pub timestamp: DateTime<Utc>,
    /// Decoder that accepted the row
    pub format: TranscriptFormat,
    /// Messages, without system context
    pub transcript: Transcript,
}

/// Sidebar entry for a user's past conversations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub preview: String,
    pub message_count: usize,
}

impl ConversationSummary {
    /// Maximum characters of the first question shown in a preview
    pub const PREVIEW_CHARS: usize = 40;

    pub fn from_stored(conversation: &StoredConversation) -> Self {
        Self {
            id: conversation.id,
            timestamp: conversation.timestamp,
            preview: conversation.transcript.preview(Self::PREVIEW_CHARS),
            message_count: conversation.transcript.len(),
        }
    }
}
