//! Per-session conversation state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{GradeRecord, Message, Transcript};

/// Whether a session accepts new turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Interactive interview
    Live,
    /// A stored transcript opened read-only
    Review,
}

/// State of one interview session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: Uuid,
    pub user: String,
    pub created_at: DateTime<Utc>,
    /// Full transcript, including the leading system context
    pub transcript: Transcript,
    /// Questions asked so far, in order
    pub questions: Vec<String>,
    /// Set once the session has been graded or opened for review
    pub ended: bool,
    pub mode: SessionMode,
    /// Grade record written when the session ended
    pub grade: Option<GradeRecord>,
}

impl SessionContext {
    pub(crate) fn new(id: Uuid, user: impl Into<String>) -> Self {
        Self {
            id,
            user: user.into(),
            created_at: Utc::now(),
            transcript: Transcript::new(),
            questions: Vec::new(),
            ended: false,
            mode: SessionMode::Live,
            grade: None,
        }
    }

    /// No further turns or grading are allowed
    pub fn is_read_only(&self) -> bool {
        self.ended || self.mode == SessionMode::Review
    }

    /// Client-facing view with system messages removed
    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            user: self.user.clone(),
            created_at: self.created_at,
            messages: self.transcript.visible().cloned().collect(),
            questions: self.questions.clone(),
            ended: self.ended,
            mode: self.mode,
            grade: self.grade.clone(),
        }
    }
}

/// Serializable snapshot of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub user: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub questions: Vec<String>,
    pub ended: bool,
    pub mode: SessionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<GradeRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_states() {
        let mut session = SessionContext::new(Uuid::new_v4(), "alice");
        assert!(!session.is_read_only());

        session.ended = true;
        assert!(session.is_read_only());

        session.ended = false;
        session.mode = SessionMode::Review;
        assert!(session.is_read_only());
    }

    #[test]
    fn test_view_hides_system_context() {
        let mut session = SessionContext::new(Uuid::new_v4(), "bob");
        session.transcript = vec![Message::system("hidden"), Message::assistant("Hi")].into();

        let view = session.view();
        assert_eq!(view.messages, vec![Message::assistant("Hi")]);
        assert_eq!(view.mode, SessionMode::Live);
    }
}
