//! Summary statistics over grade records

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::types::{GradeRecord, Letter};

/// Count of records per grade letter, modifiers folded in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradeDistribution {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d: usize,
    pub f: usize,
    pub needs_review: usize,
}

impl GradeDistribution {
    fn add(&mut self, letter: Option<Letter>) {
        let slot = match letter {
            Some(Letter::A) => &mut self.a,
            Some(Letter::B) => &mut self.b,
            Some(Letter::C) => &mut self.c,
            Some(Letter::D) => &mut self.d,
            Some(Letter::F) => &mut self.f,
            None => &mut self.needs_review,
        };
        *slot += 1;
    }
}

/// Dashboard summary
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub distribution: GradeDistribution,
    /// Submissions per UTC calendar day, ascending
    pub submissions_per_day: BTreeMap<NaiveDate, usize>,
    /// Most recent record of each student, ordered by user
    pub latest_by_student: Vec<GradeRecord>,
}

pub fn compute_stats(records: &[GradeRecord]) -> DashboardStats {
    let mut distribution = GradeDistribution::default();
    let mut submissions_per_day = BTreeMap::new();
    let mut latest: HashMap<&str, &GradeRecord> = HashMap::new();

    for record in records {
        distribution.add(record.grade.letter());
        *submissions_per_day.entry(record.timestamp.date_naive()).or_insert(0) += 1;

        latest
            .entry(record.user.as_str())
            .and_modify(|current| {
                if (record.timestamp, record.id) > (current.timestamp, current.id) {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let mut latest_by_student: Vec<GradeRecord> = latest.into_values().cloned().collect();
    latest_by_student.sort_by(|a, b| a.user.cmp(&b.user));

    DashboardStats {
        total: records.len(),
        distribution,
        submissions_per_day,
        latest_by_student,
    }
}
