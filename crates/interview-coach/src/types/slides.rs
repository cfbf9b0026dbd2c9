//! Lecture slide documents, chunks and retrieved snippets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported slide file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlideFileType {
    /// PDF export of a slide deck
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl SlideFileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Markdown => "md",
            Self::Unknown => "unknown",
        }
    }
}

/// An indexed slide deck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideDocument {
    pub id: Uuid,
    pub filename: String,
    pub file_type: SlideFileType,
    /// SHA-256 of the uploaded bytes, hex encoded
    pub content_hash: String,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

/// A chunk of slide text stored in the retrieval index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: u32,
    pub content: String,
    pub page_number: Option<u32>,
}

impl SlideChunk {
    pub fn new(document_id: Uuid, chunk_index: u32, content: String, page_number: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            chunk_index,
            content,
            page_number,
        }
    }
}

/// One ranked result from a retrieval provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedSnippet {
    /// Passage text
    pub text: String,
    /// Human-readable source, e.g. `lecture3.pdf, Page 4`
    pub source: String,
    /// Provider relevance score, higher is better
    pub score: f64,
}
