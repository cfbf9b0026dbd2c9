//! Core types for the interview coach

pub mod conversation;
pub mod grade;
pub mod message;
pub mod slides;

pub use conversation::{ConversationSummary, StoredConversation, TranscriptFormat};
pub use grade::{Grade, GradeRecord, Letter, Modifier, NEEDS_REVIEW_TEXT};
pub use message::{Message, Role, Transcript};
pub use slides::{RetrievedSnippet, SlideChunk, SlideDocument, SlideFileType};
