//! Tutor dashboard: grade search, summary statistics and conversation lookup

mod search;
mod stats;

pub use search::{search_records, GradeQuery};
pub use stats::{compute_stats, DashboardStats, GradeDistribution};

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::CoachDb;
use crate::types::{GradeRecord, StoredConversation};

/// Read-only views over the persistence store
#[derive(Clone)]
pub struct Dashboard {
    db: Arc<CoachDb>,
}

impl Dashboard {
    pub fn new(db: Arc<CoachDb>) -> Self {
        Self { db }
    }

    /// Grade records matching the query, newest first
    pub fn grades(&self, query: &GradeQuery) -> Result<Vec<GradeRecord>> {
        Ok(search_records(self.db.list_grade_records()?, query))
    }

    pub fn stats(&self) -> Result<DashboardStats> {
        Ok(compute_stats(&self.db.list_grade_records()?))
    }

    /// Conversation finder by row id
    pub fn conversation(&self, id: i64) -> Result<StoredConversation> {
        self.db
            .get_conversation(id)?
            .ok_or(Error::ConversationNotFound(id))
    }
}
