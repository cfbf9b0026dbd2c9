//! Slide ingestion for the retrieval index

mod chunker;
mod ingestor;
mod parser;

pub use chunker::TextChunker;
pub use ingestor::{IngestOutcome, SlideIngestor};
pub use parser::{ParsedSlides, SlideParser, SlidePage};
