//! Per-chunk summaries and their assembly into section results.

use std::collections::HashSet;
use std::sync::Arc;

use quickprep_core::config::{LlmConfig, PipelineConfig};
use quickprep_core::text::{normalize_whitespace, sanitize_generated, split_sentences, truncate_chars};
use quickprep_core::{SummaryMode, SummaryResult};
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, Message};

const SUMMARY_SYSTEM_PROMPT: &str =
    "You condense study material. Reply with the summary only, in plain prose, without preamble.";

const POINTS_SYSTEM_PROMPT: &str = "You extract key points from study material. Reply with one short, \
     self-contained sentence per line and nothing else.";

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Characters of each chunk sent to the model.
    pub max_input_chars: usize,
    pub max_points: usize,
    /// Points must be longer than this many characters.
    pub min_point_chars: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 2000,
            max_points: 6,
            min_point_chars: 10,
            temperature: 0.3,
            max_tokens: 512,
        }
    }
}

impl SummarizerConfig {
    pub fn from_config(pipeline: &PipelineConfig, llm: &LlmConfig) -> Self {
        Self {
            max_input_chars: pipeline.max_input_chars.max(1),
            max_points: pipeline.max_points,
            min_point_chars: pipeline.min_point_chars,
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
        }
    }
}

/// Turns chunks into summaries or key points through an [`LlmProvider`].
pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: SummarizerConfig) -> Self {
        Self { provider, config }
    }

    /// Prompt messages for one chunk, with the chunk cut to the input budget.
    pub fn prompt(&self, chunk: &str, mode: SummaryMode) -> Vec<Message> {
        let input = truncate_chars(chunk, self.config.max_input_chars);
        match mode {
            SummaryMode::Summary => vec![
                Message::system(SUMMARY_SYSTEM_PROMPT),
                Message::user(format!("summarize: {input}")),
            ],
            SummaryMode::Points => vec![
                Message::system(POINTS_SYSTEM_PROMPT),
                Message::user(format!("List the key points of the following text:\n\n{input}")),
            ],
        }
    }

    /// Raw model output for one chunk.
    pub async fn summarize_chunk(&self, chunk: &str, mode: SummaryMode) -> Result<String, LlmError> {
        let messages = self.prompt(chunk, mode);
        debug!(
            provider = self.provider.name(),
            ?mode,
            chars = chunk.chars().count(),
            "Summarizing chunk"
        );
        self.provider
            .complete(messages, self.config.temperature, self.config.max_tokens)
            .await
    }

    /// Combine the chunk outputs of one section, given in chunk order.
    pub fn assemble(&self, mode: SummaryMode, outputs: &[String]) -> SummaryResult {
        match mode {
            SummaryMode::Summary => {
                let joined = outputs
                    .iter()
                    .map(|o| sanitize_generated(o))
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                SummaryResult::Summary(normalize_whitespace(&joined))
            }
            SummaryMode::Points => SummaryResult::Points(collect_points(
                outputs,
                self.config.min_point_chars,
                self.config.max_points,
            )),
        }
    }
}

/// Strip list markers such as "-", "*", "•", "1." or "2)" from the start of a line.
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim_start();
    let line = line.trim_start_matches(['-', '*', '•', '\u{2013}', '\u{2014}']);
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }
    line.trim_start()
}

/// Sentence-split raw outputs into points: at most `max_points`, each longer
/// than `min_chars`, no repeats (case-insensitive), first-seen order.
pub fn collect_points(outputs: &[String], min_chars: usize, max_points: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut points = Vec::new();

    let candidates = outputs
        .iter()
        .flat_map(|o| o.lines())
        .map(strip_list_marker)
        .flat_map(split_sentences)
        .map(|s| sanitize_generated(strip_list_marker(&s)));

    for point in candidates {
        if points.len() >= max_points {
            break;
        }
        if point.chars().count() <= min_chars {
            continue;
        }
        if seen.insert(point.to_lowercase()) {
            points.push(point);
        }
    }
    points
}
