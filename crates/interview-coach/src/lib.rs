//! interview-coach: chat-based interview practice with rubric grading
//!
//! Students interview a simulated manufacturing-process expert backed by a
//! language model. Replies are grounded in uploaded lecture slides through a
//! SQLite full-text index, finished sessions are graded against a rubric,
//! and tutors review grades and transcripts through a dashboard API.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::CoachConfig;
pub use error::{Error, Result};
pub use session::{ConversationEngine, SessionContext, SubmitOutcome};
pub use types::{Grade, GradeRecord, Message, Transcript};
