//! Retrieval provider trait for slide context

use async_trait::async_trait;

use crate::error::Result;
use crate::types::RetrievedSnippet;

/// Trait for looking up passages relevant to a question
///
/// Results come back in the provider's own ranking, best first.
///
/// Implementations:
/// - `SlideRetriever`: SQLite FTS5 index over uploaded lecture slides
#[async_trait]
pub trait RetrievalProvider: Send + Sync {
    /// Return up to `k` snippets for `query`
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedSnippet>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
