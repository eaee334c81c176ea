//! Command-line interface: run the service or process a single file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use quickprep_core::{Config, Document, DocumentKind, SummaryMode};
use quickprep_ingest::document::ocr_from_config;
use quickprep_ingest::{extract, split_extracted, SplitterOptions};
use quickprep_llm::{create_provider, LlmProvider};
use serde::Serialize;

use crate::pipeline::{McqReport, Pipeline, SectionsReport};

/// QuickPrep: section-aware summaries and quiz questions for slides and PDFs.
#[derive(Parser, Debug)]
#[command(name = "quickprep", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP service (the default).
    Serve {
        /// Bind address; overrides HOST.
        #[arg(long)]
        host: Option<String>,
        /// Port; overrides PORT.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Extract and split a document, print its sections as JSON. No model calls.
    Sections { file: PathBuf },
    /// Summarize every section of a document.
    Summarize {
        file: PathBuf,
        /// Key points instead of prose.
        #[arg(long)]
        points: bool,
    },
    /// Generate multiple-choice questions from a PDF.
    Mcq { file: PathBuf },
}

/// Read `path` into a [`Document`], resolving the kind from its extension.
pub fn read_document(path: &Path) -> anyhow::Result<Document> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Not a file path: {}", path.display()))?;
    let kind = DocumentKind::from_filename(filename)
        .ok_or_else(|| anyhow!("Unsupported file type: {filename} (expected .pdf or .pptx)"))?;
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Document::new(filename, kind, bytes))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(&config.llm, &config.ollama)?);
    Ok(Pipeline::new(config, provider, ocr_from_config(&config.ocr)))
}

pub fn sections(config: &Config, file: &Path) -> anyhow::Result<()> {
    let doc = read_document(file)?;
    let ocr = ocr_from_config(&config.ocr);
    let extracted = extract(&doc, ocr.as_ref())?;
    let sections = split_extracted(&extracted, &SplitterOptions::from_config(&config.splitter));
    print_json(&SectionsReport::from(sections))
}

pub async fn summarize(config: &Config, file: &Path, points: bool) -> anyhow::Result<()> {
    let doc = read_document(file)?;
    let mode = if points { SummaryMode::Points } else { SummaryMode::Summary };
    let report = build_pipeline(config)?.summarize(doc, mode).await?;
    print_json(&report)
}

pub async fn mcq(config: &Config, file: &Path) -> anyhow::Result<()> {
    let doc = read_document(file)?;
    if doc.kind != DocumentKind::Pdf {
        anyhow::bail!("Questions can only be generated from a PDF");
    }
    let questions = build_pipeline(config)?.generate_mcq(doc).await?;
    print_json(&McqReport { questions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["quickprep", "summarize", "deck.pptx", "--points"]);
        match cli.command {
            Some(Command::Summarize { file, points }) => {
                assert_eq!(file, PathBuf::from("deck.pptx"));
                assert!(points);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::parse_from(["quickprep"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn read_document_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        std::fs::write(&path, b"irrelevant").unwrap();
        let err = read_document(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn read_document_resolves_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Slides.PPTX");
        std::fs::write(&path, b"bytes").unwrap();
        let doc = read_document(&path).unwrap();
        assert_eq!(doc.kind, DocumentKind::SlideDeck);
        assert_eq!(doc.filename, "Slides.PPTX");
        assert_eq!(doc.bytes, b"bytes");
    }
}
