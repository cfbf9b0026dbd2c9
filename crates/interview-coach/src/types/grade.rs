//! Grades and persisted grade records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text persisted when no grade could be extracted from the assessment
pub const NEEDS_REVIEW_TEXT: &str = "Grade not found, please review manually.";

/// Letter part of a grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Letter {
    A,
    B,
    C,
    D,
    F,
}

impl Letter {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'F' => Some(Letter::F),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Letter::A => 'A',
            Letter::B => 'B',
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::F => 'F',
        }
    }
}

/// Optional `+` / `-` suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Plus,
    Minus,
}

impl Modifier {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Modifier::Plus),
            '-' => Some(Modifier::Minus),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Modifier::Plus => '+',
            Modifier::Minus => '-',
        }
    }
}

/// Outcome of automatic grading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Grade {
    /// A letter grade with an optional modifier
    Letter(Letter, Option<Modifier>),
    /// The assessment contained no recognizable grade
    NeedsReview,
}

impl Grade {
    /// Parse a grade token such as `B+` or `F`
    ///
    /// Returns `None` for anything that is not exactly one letter in
    /// `A,B,C,D,F` optionally followed by `+` or `-`.
    pub fn parse_token(token: &str) -> Option<Self> {
        let mut chars = token.trim().chars();
        let letter = Letter::from_char(chars.next()?)?;
        let modifier = match chars.next() {
            None => None,
            Some(c) => Some(Modifier::from_char(c)?),
        };
        if chars.next().is_some() {
            return None;
        }
        Some(Grade::Letter(letter, modifier))
    }

    /// Interpret a persisted grade column; unrecognized text is `NeedsReview`
    pub fn from_stored(text: &str) -> Self {
        Self::parse_token(text).unwrap_or(Grade::NeedsReview)
    }

    pub fn letter(&self) -> Option<Letter> {
        match self {
            Grade::Letter(letter, _) => Some(*letter),
            Grade::NeedsReview => None,
        }
    }

    pub fn needs_review(&self) -> bool {
        matches!(self, Grade::NeedsReview)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Letter(letter, None) => write!(f, "{}", letter.as_char()),
            Grade::Letter(letter, Some(m)) => write!(f, "{}{}", letter.as_char(), m.as_char()),
            Grade::NeedsReview => f.write_str(NEEDS_REVIEW_TEXT),
        }
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.to_string()
    }
}

impl From<String> for Grade {
    fn from(text: String) -> Self {
        Grade::from_stored(&text)
    }
}

/// One graded session, as stored in `grade_records`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRecord {
    /// Row id
    pub id: i64,
    /// User identity
    pub user: String,
    /// When the record was written
    pub timestamp: DateTime<Utc>,
    /// Extracted grade
    pub grade: Grade,
    /// Questions asked, newline-joined
    pub questions: String,
    /// Written assessment
    pub feedback: String,
}

impl GradeRecord {
    /// Plain-text feedback document offered for download at session end
    pub fn feedback_export(&self) -> String {
        format!(
            "Username: {}\nGrade: {}\n\nQuestions:\n{}\n\nFeedback:\n{}\n",
            self.user, self.grade, self.questions, self.feedback
        )
    }

    /// Suggested filename for the feedback export
    pub fn export_filename(&self) -> String {
        format!("{}_feedback.txt", self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(Grade::parse_token("B+"), Some(Grade::Letter(Letter::B, Some(Modifier::Plus))));
        assert_eq!(Grade::parse_token("a"), Some(Grade::Letter(Letter::A, None)));
        assert_eq!(Grade::parse_token("F-"), Some(Grade::Letter(Letter::F, Some(Modifier::Minus))));
        assert_eq!(Grade::parse_token("E"), None);
        assert_eq!(Grade::parse_token("B++"), None);
        assert_eq!(Grade::parse_token(""), None);
    }

    #[test]
    fn test_stored_round_trip() {
        for text in ["A", "B+", "C-", "D", "F", NEEDS_REVIEW_TEXT] {
            assert_eq!(Grade::from_stored(text).to_string(), text);
        }
        assert_eq!(Grade::from_stored("garbage"), Grade::NeedsReview);
    }

    #[test]
    fn test_grade_serializes_as_string() {
        let json = serde_json::to_string(&Grade::Letter(Letter::C, Some(Modifier::Minus))).unwrap();
        assert_eq!(json, "\"C-\"");
    }

    #[test]
    fn test_feedback_export() {
        let record = GradeRecord {
            id: 1,
            user: "alice".to_string(),
            timestamp: Utc::now(),
            grade: Grade::Letter(Letter::B, Some(Modifier::Plus)),
            questions: "q1\nq2".to_string(),
            feedback: "Good probing.".to_string(),
        };

        let text = record.feedback_export();
        assert!(text.starts_with("Username: alice\nGrade: B+\n"));
        assert!(text.contains("Questions:\nq1\nq2\n"));
        assert!(text.contains("Feedback:\nGood probing."));
        assert_eq!(record.export_filename(), "alice_feedback.txt");
    }
}
