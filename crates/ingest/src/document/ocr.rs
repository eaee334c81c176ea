//! OCR fallback for PDFs without a usable text layer.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use quickprep_core::config::OcrConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR is disabled")]
    Disabled,
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("Renderer produced no page images")]
    NoPages,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recognizes text in a PDF by rendering its pages to images.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Returns one string per page, in page order.
    fn recognize_pdf(&self, pdf: &[u8]) -> Result<Vec<String>, OcrError>;
}

/// Always fails; used when OCR is turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledOcr;

impl OcrEngine for DisabledOcr {
    fn name(&self) -> &str {
        "disabled"
    }

    fn recognize_pdf(&self, _pdf: &[u8]) -> Result<Vec<String>, OcrError> {
        Err(OcrError::Disabled)
    }
}

/// Renders pages with `pdftoppm` and reads them with `tesseract`.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    pdftoppm_bin: String,
    tesseract_bin: String,
    dpi: u32,
    language: String,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            pdftoppm_bin: config.pdftoppm_bin.clone(),
            tesseract_bin: config.tesseract_bin.clone(),
            dpi: config.dpi,
            language: config.language.clone(),
        }
    }

    fn run(&self, tool: &str, cmd: &mut Command) -> Result<Vec<u8>, OcrError> {
        let output = cmd.output().map_err(|source| OcrError::Spawn {
            tool: tool.to_string(),
            source,
        })?;
        if !output.status.success() {
            return Err(OcrError::ToolFailed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize_pdf(&self, pdf: &[u8]) -> Result<Vec<String>, OcrError> {
        // Removed with everything in it when dropped.
        let workdir = tempfile::TempDir::new()?;
        let input = workdir.path().join("input.pdf");
        std::fs::write(&input, pdf)?;

        let prefix = workdir.path().join("page");
        self.run(
            &self.pdftoppm_bin,
            Command::new(&self.pdftoppm_bin)
                .arg("-r")
                .arg(self.dpi.to_string())
                .arg("-png")
                .arg(&input)
                .arg(&prefix),
        )?;

        let images = page_images(workdir.path())?;
        if images.is_empty() {
            return Err(OcrError::NoPages);
        }
        tracing::info!(pages = images.len(), "Running OCR on rendered pages");

        let mut pages = Vec::with_capacity(images.len());
        for image in &images {
            let stdout = self.run(
                &self.tesseract_bin,
                Command::new(&self.tesseract_bin)
                    .arg(image)
                    .arg("stdout")
                    .arg("-l")
                    .arg(&self.language),
            )?;
            pages.push(String::from_utf8_lossy(&stdout).into_owned());
        }
        Ok(pages)
    }
}

/// `page-N.png` files in `dir`, ordered by N. pdftoppm zero-pads N depending
/// on the page count, so ordering is numeric rather than lexical.
fn page_images(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut numbered: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let is_png = path.extension().and_then(|e| e.to_str()) == Some("png");
        if let (true, Some(n)) = (is_png, page_number(stem)) {
            numbered.push((n, path.clone()));
        }
    }
    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered.into_iter().map(|(_, p)| p).collect())
}

fn page_number(stem: &str) -> Option<u32> {
    stem.strip_prefix("page-")?.parse().ok()
}

/// Build the configured OCR engine.
pub fn ocr_from_config(config: &OcrConfig) -> Arc<dyn OcrEngine> {
    if config.enabled {
        Arc::new(TesseractOcr::new(config))
    } else {
        Arc::new(DisabledOcr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_images_sorted_numerically() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["page-10.png", "page-02.png", "page-1.png", "notes.txt", "page-3.ppm"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let names: Vec<String> = page_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-02.png", "page-10.png"]);
    }

    #[test]
    fn disabled_engine_always_fails() {
        assert!(matches!(DisabledOcr.recognize_pdf(b"%PDF"), Err(OcrError::Disabled)));
    }

    #[test]
    fn missing_binary_reports_spawn_error() {
        let config = OcrConfig {
            pdftoppm_bin: "quickprep-no-such-renderer".into(),
            ..OcrConfig::default()
        };
        let err = TesseractOcr::new(&config).recognize_pdf(b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, OcrError::Spawn { ref tool, .. } if tool == "quickprep-no-such-renderer"));
    }

    #[test]
    fn factory_respects_enabled_flag() {
        let off = OcrConfig {
            enabled: false,
            ..OcrConfig::default()
        };
        assert_eq!(ocr_from_config(&off).name(), "disabled");
        assert_eq!(ocr_from_config(&OcrConfig::default()).name(), "tesseract");
    }
}
