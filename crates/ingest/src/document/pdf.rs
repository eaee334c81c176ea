use super::ocr::OcrEngine;
use super::ExtractionError;

/// Text layer via pdf-extract. Pages are separated by form feeds; empty pages
/// are dropped and the rest joined with newlines.
fn extract_text_layer(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed inputs.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    let text = match result {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(e.to_string()),
        Err(panic_payload) => {
            let msg = if let Some(s) = panic_payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            return Err(format!("pdf-extract panicked: {msg}"));
        }
    };

    Ok(join_pages(text.split('\x0C')))
}

fn join_pages<'a>(pages: impl IntoIterator<Item = &'a str>) -> String {
    pages
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract PDF text, falling back to OCR exactly once when the text layer is
/// missing, blank, or unreadable.
pub fn extract_pdf(bytes: &[u8], ocr: &dyn OcrEngine) -> Result<String, ExtractionError> {
    let direct = match extract_text_layer(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("PDF text layer extraction failed: {}", e);
            String::new()
        }
    };

    if !direct.trim().is_empty() {
        return Ok(direct);
    }

    tracing::info!(engine = ocr.name(), "PDF has no text layer, falling back to OCR");
    match ocr.recognize_pdf(bytes) {
        Ok(pages) => {
            let text = join_pages(pages.iter().map(String::as_str));
            if text.trim().is_empty() {
                tracing::warn!("OCR found no text ({} pages)", pages.len());
                return Err(ExtractionError::NoText("PDF".into()));
            }
            tracing::info!("PDF text extraction via OCR succeeded ({} pages)", pages.len());
            Ok(text)
        }
        Err(e) => {
            tracing::warn!("OCR fallback failed: {}", e);
            Err(ExtractionError::NoText("PDF".into()))
        }
    }
}
