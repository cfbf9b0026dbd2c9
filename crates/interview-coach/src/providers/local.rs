//! Local retrieval provider over the SQLite slide index

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::CoachDb;
use crate::types::RetrievedSnippet;

use super::retrieval::RetrievalProvider;

/// Full-text slide search backed by `CoachDb`
pub struct SlideRetriever {
    db: Arc<CoachDb>,
}

impl SlideRetriever {
    pub fn new(db: Arc<CoachDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RetrievalProvider for SlideRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedSnippet>> {
        // CoachDb is sync, wrap in blocking task
        let db = self.db.clone();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || db.search_slide_chunks(&query, k))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    fn name(&self) -> &str {
        "sqlite-fts5"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SlideChunk, SlideDocument, SlideFileType};
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_retrieve_from_index() {
        let db = Arc::new(CoachDb::in_memory().unwrap());
        let doc = SlideDocument {
            id: Uuid::new_v4(),
            filename: "casting.md".to_string(),
            file_type: SlideFileType::Markdown,
            content_hash: "h1".to_string(),
            chunk_count: 1,
            ingested_at: Utc::now(),
        };
        let chunk = SlideChunk::new(doc.id, 0, "Sand casting uses a pattern.".to_string(), None);
        db.insert_slide_document(&doc, &[chunk]).unwrap();

        let retriever = SlideRetriever::new(db);
        let snippets = retriever.retrieve("Why use sand casting?", 4).await.unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].source, "casting.md");

        assert!(retriever.retrieve("??", 4).await.unwrap().is_empty());
    }
}
