//! Grade record search for the tutor view

use serde::Deserialize;

use crate::types::{GradeRecord, Letter};

/// Query parameters for grade search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradeQuery {
    /// Grade letter, student name fragment or id fragment
    #[serde(default)]
    pub q: Option<String>,
    /// Keep only the first N results
    #[serde(default)]
    pub top: Option<usize>,
}

impl GradeQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            top: None,
        }
    }

    pub fn top(mut self, n: usize) -> Self {
        self.top = Some(n);
        self
    }
}

/// Filter records, newest first
///
/// A one-letter query naming a grade letter matches that letter with any
/// modifier. Other queries match a case-insensitive fragment of the user or
/// the id. Records awaiting manual review never match.
pub fn search_records(mut records: Vec<GradeRecord>, query: &GradeQuery) -> Vec<GradeRecord> {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

    let needle = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .unwrap_or_default();
    let letter = letter_query(&needle);

    let filtered = records.into_iter().filter(|record| {
        if record.grade.needs_review() {
            return false;
        }
        match letter {
            Some(letter) => record.grade.letter() == Some(letter),
            None => {
                record.user.to_lowercase().contains(&needle)
                    || record.id.to_string().contains(&needle)
            }
        }
    });

    match query.top {
        Some(n) => filtered.take(n).collect(),
        None => filtered.collect(),
    }
}

fn letter_query(needle: &str) -> Option<Letter> {
    let mut chars = needle.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Letter::from_char(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Grade, Modifier};
    use chrono::{TimeZone, Utc};

    fn record(id: i64, user: &str, grade: Grade, hour: u32) -> GradeRecord {
        GradeRecord {
            id,
            user: user.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 4, 2, hour, 0, 0).unwrap(),
            grade,
            questions: "q".to_string(),
            feedback: "f".to_string(),
        }
    }

    fn records() -> Vec<GradeRecord> {
        vec![
            record(1, "Alice", Grade::Letter(Letter::A, Some(Modifier::Minus)), 8),
            record(2, "bob", Grade::Letter(Letter::B, None), 9),
            record(3, "Abdul", Grade::NeedsReview, 10),
            record(12, "carol", Grade::Letter(Letter::F, None), 11),
        ]
    }

    fn ids(records: &[GradeRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_empty_query_lists_newest_first_without_review() {
        assert_eq!(ids(&search_records(records(), &GradeQuery::default())), vec![12, 2, 1]);
    }

    #[test]
    fn test_letter_query_ignores_modifier() {
        assert_eq!(ids(&search_records(records(), &GradeQuery::new("A"))), vec![1]);
        assert_eq!(ids(&search_records(records(), &GradeQuery::new("f"))), vec![12]);
    }

    #[test]
    fn test_name_and_id_fragments() {
        assert_eq!(ids(&search_records(records(), &GradeQuery::new("AL"))), vec![1]);
        assert_eq!(ids(&search_records(records(), &GradeQuery::new("ab"))), Vec::<i64>::new());
        assert_eq!(ids(&search_records(records(), &GradeQuery::new("1"))), vec![12, 1]);
    }

    #[test]
    fn test_top_n() {
        let query = GradeQuery::default().top(2);
        assert_eq!(ids(&search_records(records(), &query)), vec![12, 2]);
    }
}
