use std::sync::Arc;

use quickprep_core::config::{LlmConfig, McqConfig};
use quickprep_core::text::truncate_chars;
use quickprep_core::{ErrorKind, McqQuestion};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::provider::{LlmError, LlmProvider, Message};

const MCQ_SYSTEM_PROMPT: &str = "You generate exam-level multiple-choice questions.";

/// Generates multiple-choice questions from document text via an LLM.
pub struct McqGenerator {
    provider: Arc<dyn LlmProvider>,
    question_count: usize,
    max_content_chars: usize,
    temperature: f32,
    max_tokens: u32,
}

impl McqGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &McqConfig, llm: &LlmConfig) -> Self {
        Self {
            provider,
            question_count: config.question_count.max(1),
            max_content_chars: config.max_content_chars,
            temperature: config.temperature,
            // A question set is much longer than a chunk summary.
            max_tokens: llm.max_tokens.max(2048),
        }
    }

    /// The user prompt for `text`, truncated to the content budget.
    pub fn prompt(&self, text: &str) -> String {
        let content = truncate_chars(text, self.max_content_chars);
        format!(
            r#"Generate {count} MCQs from the content below.

Rules:
- 4 options (A, B, C, D)
- One correct answer
- Output ONLY valid JSON
- No explanations

JSON format:
[
  {{
    "question": "...",
    "options": {{
      "A": "...",
      "B": "...",
      "C": "...",
      "D": "..."
    }},
    "answer": "A"
  }}
]

Content:
{content}
"#,
            count = self.question_count,
        )
    }

    pub async fn generate(&self, text: &str) -> Result<Vec<McqQuestion>, McqError> {
        info!(
            provider = self.provider.name(),
            questions = self.question_count,
            "Generating MCQs"
        );

        let messages = vec![Message::system(MCQ_SYSTEM_PROMPT), Message::user(self.prompt(text))];
        let response = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await
            .map_err(McqError::LlmError)?;

        debug!("LLM response: {}", response);

        let questions = parse_questions(&response)?;
        let invalid = questions.iter().filter(|q| !q.has_valid_answer()).count();
        if invalid > 0 {
            warn!(invalid, "Some questions name an answer outside A-D");
        }
        info!("Generated {} questions", questions.len());
        Ok(questions)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum McqError {
    #[error("LLM error: {0}")]
    LlmError(LlmError),
    #[error("Model returned invalid JSON: {reason}")]
    InvalidJson { reason: String, raw: String },
}

impl McqError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LlmError(e) => e.kind(),
            Self::InvalidJson { .. } => ErrorKind::ModelOutputParseFailure,
        }
    }
}

/// Either a bare array or an object wrapping one.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionPayload {
    List(Vec<McqQuestion>),
    Wrapped { questions: Vec<McqQuestion> },
}

/// Parse the model reply into questions, tolerating code fences and prose.
pub fn parse_questions(response: &str) -> Result<Vec<McqQuestion>, McqError> {
    let json_str = extract_json(response);
    let payload: QuestionPayload =
        serde_json::from_str(json_str).map_err(|e| McqError::InvalidJson {
            reason: e.to_string(),
            raw: response.to_string(),
        })?;
    Ok(match payload {
        QuestionPayload::List(questions) => questions,
        QuestionPayload::Wrapped { questions } => questions,
    })
}

/// Extract JSON from an LLM response, handling markdown code blocks.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` blocks
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Handle ``` ... ``` blocks
    if let Some(start) = trimmed.find("```") {
        let json_start = start + 3;
        // Skip past any language identifier on the same line
        let after_tick = &trimmed[json_start..];
        let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after_tick[content_start..].find("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    // Raw JSON: whichever of '[' or '{' opens first
    let open = match (trimmed.find('['), trimmed.find('{')) {
        (Some(a), Some(o)) => Some((a.min(o), if a < o { ']' } else { '}' })),
        (Some(a), None) => Some((a, ']')),
        (None, Some(o)) => Some((o, '}')),
        (None, None) => None,
    };
    if let Some((start, close)) = open {
        if let Some(end) = trimmed.rfind(close) {
            if end > start {
                return &trimmed[start..=end];
            }
        }
    }

    trimmed
}
