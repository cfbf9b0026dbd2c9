//! Slide ingestion pipeline: parse, dedup, chunk and index

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::CoachDb;
use crate::types::SlideDocument;

use super::chunker::TextChunker;
use super::parser::SlideParser;

/// Result of ingesting one file
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// The indexed document (existing one for duplicates)
    pub document: SlideDocument,
    /// Identical content was already indexed
    pub duplicate: bool,
}

/// Adds uploaded slide files to the retrieval index
pub struct SlideIngestor {
    db: Arc<CoachDb>,
    chunker: TextChunker,
}

impl SlideIngestor {
    pub fn new(db: Arc<CoachDb>, chunker: TextChunker) -> Self {
        Self { db, chunker }
    }

    /// Ingest one file; re-uploading identical bytes returns the existing document
    pub async fn ingest(&self, filename: &str, data: Vec<u8>) -> Result<IngestOutcome> {
        let name = filename.to_string();
        // PDF extraction is CPU-bound
        let parsed = tokio::task::spawn_blocking(move || SlideParser::parse(&name, &data))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        if let Some(existing) = self.db.find_slide_document_by_hash(&parsed.content_hash)? {
            tracing::info!(
                "Skipping {}: same content already indexed as {}",
                filename,
                existing.filename
            );
            return Ok(IngestOutcome {
                document: existing,
                duplicate: true,
            });
        }

        let document_id = Uuid::new_v4();
        let chunks = self.chunker.chunk_pages(document_id, &parsed.pages);
        let page_count = parsed.pages.len();
        let char_count = parsed.char_count();

        let document = SlideDocument {
            id: document_id,
            filename: filename.to_string(),
            file_type: parsed.file_type,
            content_hash: parsed.content_hash,
            chunk_count: chunks.len(),
            ingested_at: Utc::now(),
        };

        let db = self.db.clone();
        let doc = document.clone();
        tokio::task::spawn_blocking(move || db.insert_slide_document(&doc, &chunks))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        tracing::info!(
            "Ingested {} ({} pages, {} chars, {} chunks)",
            filename,
            page_count,
            char_count,
            document.chunk_count
        );

        Ok(IngestOutcome {
            document,
            duplicate: false,
        })
    }
}
