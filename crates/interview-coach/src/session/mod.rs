//! Interview sessions: per-session state and the engine that drives it

mod context;
mod engine;
mod script;

pub use context::{SessionContext, SessionMode, SessionView};
pub use engine::{ConversationEngine, IgnoreReason, SubmitOutcome};
pub use script::InterviewScript;
