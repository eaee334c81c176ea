//! Shared fixtures for the server tests.

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use quickprep_core::{Config, Document, DocumentKind};
use quickprep_ingest::document::{OcrEngine, OcrError};
use quickprep_llm::testing::FakeProvider;
use tempfile::TempDir;

use crate::state::AppState;

/// OCR stand-in that returns fixed text and counts invocations.
pub struct CountingOcr {
    text: String,
    calls: AtomicUsize,
}

impl CountingOcr {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for CountingOcr {
    fn name(&self) -> &str {
        "counting"
    }

    fn recognize_pdf(&self, _pdf: &[u8]) -> Result<Vec<String>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.text.clone()])
    }
}

/// Bytes with no text layer, so PDF extraction always goes through OCR.
pub fn pdf_bytes() -> Vec<u8> {
    b"not really a pdf, only scanned pages".to_vec()
}

pub fn pdf_document() -> Document {
    Document::new("lecture.pdf", DocumentKind::Pdf, pdf_bytes())
}

const DECK_SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
  <p:sp><p:txBody><a:p><a:r><a:rPr sz="4000"/><a:t>Quarterly review</a:t></a:r></a:p></p:txBody></p:sp>
  <p:sp><p:txBody><a:p><a:r><a:rPr sz="1800"/><a:t>Revenue grew in every single region we operate in.</a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:sld>"#;

/// Minimal one-slide deck: a large title and one body paragraph.
pub fn pptx_bytes() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        zip.start_file("ppt/slides/slide1.xml", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(DECK_SLIDE.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}

/// A single-file multipart POST to `uri`.
pub fn multipart_request(uri: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "quickprep-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post(uri)
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

/// State wired to fakes, uploading into a fresh temp dir.
pub fn test_state(
    provider: FakeProvider,
    ocr_text: &str,
) -> (Arc<AppState>, Arc<FakeProvider>, Arc<CountingOcr>, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.server.upload_dir = dir.path().join("uploads");

    let provider = Arc::new(provider);
    let ocr = Arc::new(CountingOcr::new(ocr_text));
    let state = AppState::with_parts(config, provider.clone(), ocr.clone());
    (Arc::new(state), provider, ocr, dir)
}
