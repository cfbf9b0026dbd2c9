//! Grading of a finished interview against the rubric

use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::{Grade, Message};

use super::prompt::PromptBuilder;

fn grade_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Grade:\s*([ABCDF][+-]?)").expect("Invalid regex"))
}

/// Split a grading response into feedback and grade
///
/// The first `Grade: X` match wins and the trimmed text before it is the
/// feedback. Without a match the grade needs manual review and the whole
/// response is kept as feedback.
pub fn extract_grade(response: &str) -> (String, Grade) {
    let Some(captures) = grade_pattern().captures(response) else {
        return (response.to_string(), Grade::NeedsReview);
    };

    let (Some(whole), Some(token)) = (captures.get(0), captures.get(1)) else {
        return (response.to_string(), Grade::NeedsReview);
    };

    match Grade::parse_token(token.as_str()) {
        Some(grade) => (response[..whole.start()].trim().to_string(), grade),
        None => (response.to_string(), Grade::NeedsReview),
    }
}

/// Scores the questions of a session with a one-shot LLM request
pub struct GradingEngine {
    llm: Arc<dyn LlmProvider>,
    rubric: String,
}

impl GradingEngine {
    pub fn new(llm: Arc<dyn LlmProvider>, rubric: impl Into<String>) -> Self {
        Self {
            llm,
            rubric: rubric.into(),
        }
    }

    /// Evaluate the questions, returning `(feedback, grade)`
    ///
    /// Provider errors propagate; there is no retry.
    pub async fn evaluate(&self, questions: &[String]) -> Result<(String, Grade)> {
        let prompt = PromptBuilder::build_grading_prompt(&self.rubric, questions);
        let response = self.llm.chat(&[Message::system(prompt)]).await?;

        let (feedback, grade) = extract_grade(&response);
        if grade.needs_review() {
            tracing::warn!("No grade found in assessment; flagged for manual review");
        } else {
            tracing::info!("Assessment graded {} for {} questions", grade, questions.len());
        }

        Ok((feedback, grade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use crate::types::{Letter, Modifier};

    #[test]
    fn test_extract_grade_example() {
        let (feedback, grade) = extract_grade("...solid grasp of process... Grade: B+");
        assert_eq!(feedback, "...solid grasp of process...");
        assert_eq!(grade, Grade::Letter(Letter::B, Some(Modifier::Plus)));
    }

    #[test]
    fn test_extract_grade_first_match_wins() {
        let (feedback, grade) = extract_grade("Good.\nGrade:A-\nLater note. Grade: F");
        assert_eq!(feedback, "Good.");
        assert_eq!(grade.to_string(), "A-");
    }

    #[test]
    fn test_extract_grade_missing() {
        let response = "  Thorough questions overall, Grade: E  ";
        let (feedback, grade) = extract_grade(response);
        assert_eq!(grade, Grade::NeedsReview);
        assert_eq!(feedback, response);
    }

    #[tokio::test]
    async fn test_evaluate_sends_single_system_message() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok("Nice probing. Grade: A".to_string())]));
        let engine = GradingEngine::new(llm.clone(), "RUBRIC");

        let questions = vec![
            "What tolerance does the lathe hold?".to_string(),
            "How often is the die replaced?".to_string(),
        ];
        let (feedback, grade) = engine.evaluate(&questions).await.unwrap();
        assert_eq!(feedback, "Nice probing.");
        assert_eq!(grade.to_string(), "A");

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 1);
        assert!(requests[0][0].is_system());
        assert!(requests[0][0].content().contains("2. How often is the die replaced?"));
    }

    #[tokio::test]
    async fn test_evaluate_grade_always_valid() {
        for response in ["Grade: C", "no grade here", "Grade: D-", ""] {
            let llm = Arc::new(ScriptedLlm::new(vec![Ok(response.to_string())]));
            let engine = GradingEngine::new(llm, "RUBRIC");
            let (_, grade) = engine.evaluate(&["q".to_string()]).await.unwrap();
            let text = grade.to_string();
            assert!(
                grade.needs_review() || Grade::parse_token(&text) == Some(grade),
                "unexpected grade {}",
                text
            );
        }
    }

    #[tokio::test]
    async fn test_evaluate_propagates_provider_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err("backend down".to_string())]));
        let engine = GradingEngine::new(llm.clone(), "RUBRIC");
        assert!(engine.evaluate(&["q".to_string()]).await.is_err());
        assert_eq!(llm.requests().len(), 1);
    }
}
