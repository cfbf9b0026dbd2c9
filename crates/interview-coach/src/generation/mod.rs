//! Prompt construction and rubric grading

pub mod grading;
pub mod prompt;

pub use grading::{extract_grade, GradingEngine};
pub use prompt::PromptBuilder;
