//! Conversation engine: turns, grading and review of interview sessions

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generation::{GradingEngine, PromptBuilder};
use crate::providers::{LlmProvider, RetrievalProvider};
use crate::storage::CoachDb;
use crate::types::{GradeRecord, Message, RetrievedSnippet, Transcript};

use super::context::{SessionContext, SessionMode};
use super::script::InterviewScript;

/// Why a submitted message was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The session has been graded
    Ended,
    /// The session holds a stored transcript
    ReviewMode,
    /// The message was blank
    EmptyMessage,
}

/// Result of submitting a user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The assistant replied; both messages are now in the transcript
    Replied { reply: String },
    /// Nothing was sent and the session is unchanged
    Ignored { reason: IgnoreReason },
}

/// Drives interview sessions against the language model
pub struct ConversationEngine {
    llm: Arc<dyn LlmProvider>,
    retriever: Option<Arc<dyn RetrievalProvider>>,
    grader: GradingEngine,
    db: Arc<CoachDb>,
    script: Arc<InterviewScript>,
    top_k: usize,
}

impl ConversationEngine {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        retriever: Option<Arc<dyn RetrievalProvider>>,
        db: Arc<CoachDb>,
        script: InterviewScript,
        top_k: usize,
    ) -> Self {
        let grader = GradingEngine::new(llm.clone(), script.rubric.clone());
        Self {
            llm,
            retriever,
            grader,
            db,
            script: Arc::new(script),
            top_k,
        }
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    pub fn retriever(&self) -> Option<&Arc<dyn RetrievalProvider>> {
        self.retriever.as_ref()
    }

    pub fn db(&self) -> &Arc<CoachDb> {
        &self.db
    }

    /// Start a fresh session for `user`
    pub fn reset(&self, user: &str) -> SessionContext {
        let mut session = SessionContext::new(Uuid::new_v4(), user);
        self.reset_session(&mut session);
        tracing::info!("New session {} for {}", session.id, user);
        session
    }

    /// Reseed an existing session in place, keeping its id and user
    pub fn reset_session(&self, session: &mut SessionContext) {
        session.transcript = Transcript::from(vec![
            Message::system(self.script.context.clone()),
            Message::assistant(self.script.greeting.clone()),
        ]);
        session.questions.clear();
        session.ended = false;
        session.mode = SessionMode::Live;
        session.grade = None;
    }

    /// Send one user message and wait for the full reply
    ///
    /// Ended and review sessions ignore the message. Retrieval failures only
    /// drop the slide context. On a provider error the session is left
    /// exactly as it was.
    pub async fn submit_user_message(
        &self,
        session: &mut SessionContext,
        text: &str,
    ) -> Result<SubmitOutcome> {
        let reason = if session.is_read_only() {
            Some(read_only_reason(session))
        } else if text.trim().is_empty() {
            Some(IgnoreReason::EmptyMessage)
        } else {
            None
        };

        if let Some(reason) = reason {
            tracing::debug!("Ignoring message for session {}: {:?}", session.id, reason);
            return Ok(SubmitOutcome::Ignored { reason });
        }

        let snippets = self.retrieve_context(text).await;

        let mut request = Vec::with_capacity(session.transcript.len() + 3);
        request.push(Message::system(self.script.context.clone()));
        request.extend(PromptBuilder::build_context_message(&snippets));
        request.extend(session.transcript.visible().cloned());
        request.push(Message::user(text));

        let reply = self.llm.chat(&request).await?;

        session.transcript.push(Message::user(text));
        session.questions.push(text.to_string());
        session.transcript.push(Message::assistant(reply.clone()));

        tracing::info!(
            "Session {}: question {} answered ({} snippets)",
            session.id,
            session.questions.len(),
            snippets.len()
        );

        Ok(SubmitOutcome::Replied { reply })
    }

    async fn retrieve_context(&self, query: &str) -> Vec<RetrievedSnippet> {
        let Some(retriever) = &self.retriever else {
            return Vec::new();
        };

        match retriever.retrieve(query, self.top_k).await {
            Ok(snippets) => snippets,
            Err(e) => {
                tracing::warn!("Retrieval via {} failed, continuing without context: {}", retriever.name(), e);
                Vec::new()
            }
        }
    }

    /// Grade the session, persist it and seal it
    ///
    /// The session is only marked ended after grading and persistence both
    /// succeed.
    pub async fn end_session(&self, session: &mut SessionContext) -> Result<GradeRecord> {
        if session.is_read_only() {
            return Err(match session.mode {
                SessionMode::Review => Error::ReadOnly(session.id),
                SessionMode::Live => Error::SessionEnded(session.id),
            });
        }
        if session.questions.is_empty() {
            return Err(Error::EmptySession(session.id));
        }

        let (feedback, grade) = self.grader.evaluate(&session.questions).await?;

        let db = self.db.clone();
        let user = session.user.clone();
        let transcript = session.transcript.clone();
        let questions = session.questions.clone();
        let record = tokio::task::spawn_blocking(move || {
            db.record_session(&user, &transcript, grade, &questions, &feedback)
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        session.ended = true;
        session.grade = Some(record.clone());

        tracing::info!("Session {} ended with grade {}", session.id, record.grade);
        Ok(record)
    }

    /// Open a stored transcript read-only in this session
    pub fn load_for_review(&self, session: &mut SessionContext, transcript: &Transcript) {
        session.transcript = transcript.without_system();
        session.questions = transcript.user_questions();
        session.ended = true;
        session.mode = SessionMode::Review;
        session.grade = None;
    }

    /// Load one of the user's saved conversations for review
    pub async fn review_conversation(
        &self,
        session: &mut SessionContext,
        conversation_id: i64,
    ) -> Result<()> {
        let db = self.db.clone();
        let stored = tokio::task::spawn_blocking(move || db.get_conversation(conversation_id))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??
            .filter(|c| c.user == session.user)
            .ok_or(Error::ConversationNotFound(conversation_id))?;

        self.load_for_review(session, &stored.transcript);
        tracing::info!(
            "Session {} reviewing conversation {} ({:?})",
            session.id,
            conversation_id,
            stored.format
        );
        Ok(())
    }
}

fn read_only_reason(session: &SessionContext) -> IgnoreReason {
    match session.mode {
        SessionMode::Review => IgnoreReason::ReviewMode,
        SessionMode::Live => IgnoreReason::Ended,
    }
}
