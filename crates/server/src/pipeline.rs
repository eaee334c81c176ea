//! Extract → split → chunk → generate, shared by the HTTP handlers and the CLI.

use std::sync::Arc;

use quickprep_core::config::Config;
use quickprep_core::text::normalize_whitespace;
use quickprep_core::{Document, ErrorKind, McqQuestion, SectionSummary, SummaryMode};
use quickprep_ingest::document::OcrEngine;
use quickprep_ingest::{
    chunk_text, extract, split_extracted, ChunkConfig, ExtractedDocument, ExtractionError,
    Sections, SplitterOptions,
};
use quickprep_llm::{
    ChunkDispatcher, ChunkJob, LlmError, LlmProvider, McqError, McqGenerator, Summarizer,
    SummarizerConfig,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Generation failed in section \"{heading}\": {source}")]
    Generation {
        heading: String,
        #[source]
        source: LlmError,
    },

    #[error(transparent)]
    Mcq(#[from] McqError),

    #[error("PDF has insufficient text ({chars} characters, need at least {min})")]
    InsufficientText { chars: usize, min: usize },

    #[error("Extraction task failed: {0}")]
    Task(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Extraction(e) => e.kind(),
            Self::Generation { source, .. } => source.kind(),
            Self::Mcq(e) => e.kind(),
            Self::InsufficientText { .. } => ErrorKind::BadRequest,
            Self::Task(_) => ErrorKind::Internal,
        }
    }
}

/// Body of a summarize response.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub sections: Vec<SectionSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Body of a question-generation response.
#[derive(Debug, Serialize)]
pub struct McqReport {
    pub questions: Vec<McqQuestion>,
}

/// Body of the `sections` CLI command.
#[derive(Debug, Serialize)]
pub struct SectionsReport {
    pub sections: Sections,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<Sections> for SectionsReport {
    fn from(sections: Sections) -> Self {
        let warnings = sections.warnings();
        Self { sections, warnings }
    }
}

/// Everything a request needs, built once at startup.
pub struct Pipeline {
    summarizer: Summarizer,
    mcq: McqGenerator,
    ocr: Arc<dyn OcrEngine>,
    splitter: SplitterOptions,
    chunking: ChunkConfig,
    dispatcher: ChunkDispatcher,
    mcq_min_text_chars: usize,
}

impl Pipeline {
    pub fn new(config: &Config, provider: Arc<dyn LlmProvider>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            summarizer: Summarizer::new(
                provider.clone(),
                SummarizerConfig::from_config(&config.pipeline, &config.llm),
            ),
            mcq: McqGenerator::new(provider, &config.mcq, &config.llm),
            ocr,
            splitter: SplitterOptions::from_config(&config.splitter),
            chunking: ChunkConfig::from_pipeline(&config.pipeline),
            dispatcher: ChunkDispatcher::from_config(&config.pipeline),
            mcq_min_text_chars: config.mcq.min_text_chars,
        }
    }

    /// Run text extraction on the blocking pool.
    pub async fn extract(&self, doc: Document) -> Result<ExtractedDocument, PipelineError> {
        let ocr = self.ocr.clone();
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            extract(&doc, ocr.as_ref())
        })
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))?
        .map_err(PipelineError::from)
    }

    pub fn split(&self, extracted: &ExtractedDocument) -> Sections {
        let sections = split_extracted(extracted, &self.splitter);
        info!(
            sections = sections.len(),
            duplicates = sections.duplicate_headings().len(),
            "Split document into sections"
        );
        sections
    }

    pub async fn sections(&self, doc: Document) -> Result<Sections, PipelineError> {
        let extracted = self.extract(doc).await?;
        Ok(self.split(&extracted))
    }

    /// Summarize every non-empty section of `doc`.
    ///
    /// Chunks of all sections share one bounded queue. If any chunk fails the
    /// whole request fails with the first failure in document order.
    pub async fn summarize(
        &self,
        doc: Document,
        mode: SummaryMode,
    ) -> Result<SummaryReport, PipelineError> {
        let sections = self.sections(doc).await?;
        let warnings = sections.warnings();

        let mut headings = Vec::new();
        let mut jobs = Vec::new();
        for (section, (heading, body)) in sections.non_empty().enumerate() {
            headings.push(heading.to_string());
            jobs.extend(
                chunk_text(&normalize_whitespace(body), self.chunking).map(|chunk| ChunkJob {
                    section,
                    chunk: chunk.index,
                    content: chunk.content,
                }),
            );
        }

        info!(
            sections = headings.len(),
            chunks = jobs.len(),
            ?mode,
            concurrency = self.dispatcher.concurrency(),
            "Summarizing"
        );

        let summarizer = &self.summarizer;
        let outputs = self
            .dispatcher
            .run(jobs, |job| async move {
                summarizer.summarize_chunk(&job.content, mode).await
            })
            .await
            .map_err(|failure| {
                let heading = headings[failure.section].clone();
                warn!(heading = %heading, chunk = failure.chunk, "Chunk failed: {}", failure.error);
                PipelineError::Generation {
                    heading,
                    source: failure.error,
                }
            })?;

        let mut per_section: Vec<Vec<String>> = vec![Vec::new(); headings.len()];
        for output in outputs {
            per_section[output.section].push(output.text);
        }

        let sections = headings
            .into_iter()
            .zip(per_section)
            .map(|(heading, outputs)| SectionSummary {
                heading,
                result: summarizer.assemble(mode, &outputs),
            })
            .collect();

        Ok(SummaryReport { sections, warnings })
    }

    /// Generate multiple-choice questions from the whole document text.
    pub async fn generate_mcq(&self, doc: Document) -> Result<Vec<McqQuestion>, PipelineError> {
        let extracted = self.extract(doc).await?;
        let text = extracted.full_text();
        let chars = text.trim().chars().count();
        if chars < self.mcq_min_text_chars {
            return Err(PipelineError::InsufficientText {
                chars,
                min: self.mcq_min_text_chars,
            });
        }
        Ok(self.mcq.generate(&text).await?)
    }
}
