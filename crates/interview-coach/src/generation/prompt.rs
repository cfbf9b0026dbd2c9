//! Prompt templates for chat augmentation and grading

use crate::types::{Message, RetrievedSnippet};

/// Prompt builder for interview and grading requests
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the system message carrying retrieved lecture passages
    ///
    /// Returns `None` when there is nothing to inject.
    pub fn build_context_message(snippets: &[RetrievedSnippet]) -> Option<Message> {
        if snippets.is_empty() {
            return None;
        }

        let mut context = String::from(
            "Relevant excerpts from the course lecture slides. Use them where they help \
             answer the student's question and stay in character.\n\n",
        );

        for (i, snippet) in snippets.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {}\n\nContent:\n{}\n\n---\n\n",
                i + 1,
                snippet.source,
                snippet.text
            ));
        }

        Some(Message::system(context.trim_end()))
    }

    /// Build the one-shot grading prompt from the rubric and the questions asked
    pub fn build_grading_prompt(rubric: &str, questions: &[String]) -> String {
        let listed = questions
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}", i + 1, q))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"{rubric}

The following is the list of questions asked by the student. Evaluate their performance.

Student's questions:
{questions}"#,
            rubric = rubric.trim(),
            questions = listed
        )
    }
}
