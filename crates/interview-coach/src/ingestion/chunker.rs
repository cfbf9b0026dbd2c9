//! Text chunking with page tracking

use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::types::SlideChunk;

use super::parser::SlidePage;

/// Text chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in bytes
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            min_size: 50,
        }
    }

    /// Create a chunker from config
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            min_size: config.min_chunk_size,
        }
    }

    /// Chunk every page of a document, numbering chunks across pages
    ///
    /// Only multi-page documents record page numbers on their chunks.
    pub fn chunk_pages(&self, document_id: Uuid, pages: &[SlidePage]) -> Vec<SlideChunk> {
        let paginated = pages.len() > 1;
        let mut chunks = Vec::new();

        for page in pages {
            let page_number = paginated.then_some(page.page_number);
            for content in self.chunk_text(&page.content) {
                chunks.push(SlideChunk::new(
                    document_id,
                    chunks.len() as u32,
                    content,
                    page_number,
                ));
            }
        }

        chunks
    }

    /// Split text into overlapping chunks along sentence boundaries
    ///
    /// Chunks shorter than the minimum are dropped, except that text with no
    /// other chunk still yields one.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current_chunk = String::new();

        for sentence in text.split_sentence_bounds() {
            // If adding this sentence exceeds chunk size, save current chunk
            if !current_chunk.is_empty() && current_chunk.len() + sentence.len() > self.chunk_size {
                if current_chunk.trim().len() >= self.min_size {
                    chunks.push(current_chunk.trim().to_string());
                }

                // Start new chunk with overlap
                current_chunk = self.get_overlap_text(&current_chunk);
            }

            current_chunk.push_str(sentence);
        }

        let last = current_chunk.trim();
        if last.len() >= self.min_size || (chunks.is_empty() && !last.is_empty()) {
            chunks.push(last.to_string());
        }

        chunks
    }

    /// Get overlap text from the end of a chunk
    fn get_overlap_text(&self, text: &str) -> String {
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len().saturating_sub(self.overlap);

        // Ensure we're at a valid UTF-8 character boundary
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }

        let overlap_text = &text[start..];

        // Try to start at a sentence boundary
        if let Some(pos) = overlap_text.find(". ") {
            return overlap_text[pos + 2..].to_string();
        }

        // Fall back to word boundary
        if let Some(pos) = overlap_text.find(' ') {
            return overlap_text[pos + 1..].to_string();
        }

        overlap_text.to_string()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}
