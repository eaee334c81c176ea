//! Multipart upload staging.
//!
//! The file field is streamed into a uniquely named temporary file inside the
//! upload directory. The file is removed when the [`StagedUpload`] drops, on
//! success and error paths alike.

use std::path::Path;

use axum::extract::Multipart;
use quickprep_core::{Document, DocumentKind, ErrorKind};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::ApiError;

#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    pub filename: String,
    pub kind: DocumentKind,
    pub size: u64,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the staged bytes back as a [`Document`].
    pub async fn load(&self) -> Result<Document, ApiError> {
        let bytes = tokio::fs::read(self.path())
            .await
            .map_err(|e| ApiError::internal(format!("Failed to read staged upload: {e}")))?;
        Ok(Document::new(self.filename.clone(), self.kind, bytes))
    }
}

/// Strip any client-supplied directory components.
fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// The filename must carry the extension of `expected`; anything else is
/// rejected before a byte is read.
pub fn check_kind(filename: &str, expected: DocumentKind) -> Result<DocumentKind, ApiError> {
    match DocumentKind::from_filename(filename) {
        Some(kind) if kind == expected => Ok(kind),
        _ => Err(ApiError::new(
            ErrorKind::UnsupportedFileType,
            format!("Only .{} files are accepted, got \"{filename}\"", expected.extension()),
        )),
    }
}

/// Stream the first file field of `multipart` into `upload_dir`.
pub async fn stage_upload(
    multipart: &mut Multipart,
    expected: DocumentKind,
    upload_dir: &Path,
) -> Result<StagedUpload, ApiError> {
    loop {
        let mut field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Multipart error: {e}")))?
            .ok_or_else(|| ApiError::bad_request("No file provided"))?;

        let Some(filename) = field.file_name().map(|n| base_name(n).to_string()) else {
            continue;
        };
        let kind = check_kind(&filename, expected)?;

        tokio::fs::create_dir_all(upload_dir)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create upload dir: {e}")))?;
        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", kind.extension()))
            .tempfile_in(upload_dir)
            .map_err(|e| ApiError::internal(format!("Failed to stage upload: {e}")))?;
        let handle = file
            .as_file()
            .try_clone()
            .map_err(|e| ApiError::internal(format!("Failed to stage upload: {e}")))?;
        let mut out = tokio::fs::File::from_std(handle);

        let mut size = 0u64;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?
        {
            size += chunk.len() as u64;
            out.write_all(&chunk)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to write upload: {e}")))?;
        }
        out.flush()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to write upload: {e}")))?;

        debug!(filename = %filename, size, path = %file.path().display(), "Staged upload");
        return Ok(StagedUpload {
            file,
            filename,
            kind,
            size,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_must_match_endpoint() {
        assert_eq!(check_kind("Deck.PPTX", DocumentKind::SlideDeck).unwrap(), DocumentKind::SlideDeck);
        let err = check_kind("report.docx", DocumentKind::Pdf).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedFileType);
        assert!(check_kind("slides.pptx", DocumentKind::Pdf).is_err());
        assert!(check_kind("no_extension", DocumentKind::Pdf).is_err());
    }

    #[test]
    fn directory_components_are_dropped() {
        assert_eq!(base_name("../../etc/notes.pdf"), "notes.pdf");
        assert_eq!(base_name(r"C:\Users\me\deck.pptx"), "deck.pptx");
        assert_eq!(base_name("plain.pdf"), "plain.pdf");
    }
}
