//! Storage module for persistent data storage
//!
//! Provides SQLite-based persistence for grade records, saved conversations
//! and the slide retrieval index.

mod database;
pub mod transcript_codec;

pub use database::{CoachDb, TIMESTAMP_FORMAT};
pub use transcript_codec::{DecodeError, DecodedTranscript};
