//! Document ingestion: text extraction, heading-based sectioning and
//! sentence-aligned chunking.

pub mod chunker;
pub mod document;
pub mod section;

pub use chunker::{chunk_text, ChunkConfig, Chunks};
pub use document::{extract, ExtractedContent, ExtractedDocument, ExtractionError};
pub use section::{split_extracted, split_sections, Sections, SplitterOptions};
