//! Fixed texts that frame every interview

use std::path::Path;

use crate::config::InterviewConfig;
use crate::error::{Error, Result};

/// Interviewee context, grading rubric and opening greeting
#[derive(Debug, Clone)]
pub struct InterviewScript {
    /// System context describing the simulated interviewee
    pub context: String,
    /// Rubric the grading prompt starts with
    pub rubric: String,
    /// First assistant message of every session
    pub greeting: String,
}

impl InterviewScript {
    pub fn new(
        context: impl Into<String>,
        rubric: impl Into<String>,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            rubric: rubric.into(),
            greeting: greeting.into(),
        }
    }

    /// Read the context and rubric files named in config
    pub fn load(config: &InterviewConfig) -> Result<Self> {
        let context = read_text(&config.context_path)?;
        let rubric = read_text(&config.rubric_path)?;

        tracing::info!(
            "Loaded interview script: context {} chars, rubric {} chars",
            context.len(),
            rubric.len()
        );

        Ok(Self::new(context, rubric, config.greeting.clone()))
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read '{}': {}", path.display(), e)))
}
