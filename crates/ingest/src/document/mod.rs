pub mod ocr;
mod pdf;
mod pptx;

use quickprep_core::{Block, Document, DocumentKind, ErrorKind};
use thiserror::Error;

pub use ocr::{ocr_from_config, DisabledOcr, OcrEngine, OcrError, TesseractOcr};
pub use pdf::extract_pdf;
pub use pptx::extract_pptx;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PPTX extraction failed: {0}")]
    PptxError(String),
    #[error("Could not extract text from {0}")]
    NoText(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PptxError(_) | Self::NoText(_) => ErrorKind::ExtractionFailure,
            Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// What the extractor produced: flat text for PDFs, styled blocks for decks.
#[derive(Debug, Clone)]
pub enum ExtractedContent {
    Text(String),
    Blocks(Vec<Block>),
}

/// Result of extracting text from a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Original filename.
    pub filename: String,
    pub kind: DocumentKind,
    pub content: ExtractedContent,
}

impl ExtractedDocument {
    /// Get all text concatenated, one line per block for slide decks.
    pub fn full_text(&self) -> String {
        match &self.content {
            ExtractedContent::Text(text) => text.clone(),
            ExtractedContent::Blocks(blocks) => blocks
                .iter()
                .filter(|b| !b.is_blank())
                .map(|b| b.text())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Extract text from an uploaded document. PDFs may fall back to `ocr`.
pub fn extract(doc: &Document, ocr: &dyn OcrEngine) -> Result<ExtractedDocument, ExtractionError> {
    let content = match doc.kind {
        DocumentKind::Pdf => ExtractedContent::Text(extract_pdf(&doc.bytes, ocr)?),
        DocumentKind::SlideDeck => {
            let blocks = extract_pptx(&doc.bytes)?;
            if blocks.iter().all(Block::is_blank) {
                return Err(ExtractionError::NoText(doc.filename.clone()));
            }
            ExtractedContent::Blocks(blocks)
        }
    };

    tracing::info!(
        filename = %doc.filename,
        kind = %doc.kind,
        "Extracted document text"
    );

    Ok(ExtractedDocument {
        filename: doc.filename.clone(),
        kind: doc.kind,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickprep_core::TextRun;

    #[test]
    fn full_text_of_blocks_skips_blank() {
        let doc = ExtractedDocument {
            filename: "deck.pptx".into(),
            kind: DocumentKind::SlideDeck,
            content: ExtractedContent::Blocks(vec![
                Block::new(vec![TextRun::styled("Title", true, Some(32.0))]),
                Block::plain("  "),
                Block::plain("Body text."),
            ]),
        };
        assert_eq!(doc.full_text(), "Title\nBody text.");
    }
}
