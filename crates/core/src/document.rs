use serde::{Deserialize, Serialize};

/// Source format of an uploaded document, derived from its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    SlideDeck,
}

impl DocumentKind {
    /// Resolve the kind from a filename extension (case-insensitive).
    /// Returns `None` for anything that is not `.pdf` or `.pptx`.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "pptx" => Some(Self::SlideDeck),
            _ => None,
        }
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::SlideDeck => "pptx",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::SlideDeck => "PPTX",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw uploaded bytes plus the declared kind. Read once, then dropped.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, kind: DocumentKind, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            kind,
            bytes,
        }
    }
}

// ── Blocks ──────────────────────────────────────────────────────────────────

/// A styled run of text inside a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    /// Font size in points; `None` when the source leaves it unset.
    pub font_size: Option<f32>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn styled(text: impl Into<String>, bold: bool, font_size: Option<f32>) -> Self {
        Self {
            text: text.into(),
            bold,
            font_size,
        }
    }
}

/// A unit of extracted text: a line for PDFs, a paragraph for slide decks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub runs: Vec<TextRun>,
}

impl Block {
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self { runs }
    }

    /// A block made of one unstyled run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(vec![TextRun::plain(text)])
    }

    /// Concatenated run text, trimmed.
    pub fn text(&self) -> String {
        let joined: String = self.runs.iter().map(|r| r.text.as_str()).collect();
        joined.trim().to_string()
    }

    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// Largest explicit font size among the runs.
    pub fn max_font_size(&self) -> Option<f32> {
        self.runs
            .iter()
            .filter_map(|r| r.font_size)
            .fold(None, |acc, s| Some(acc.map_or(s, |m: f32| m.max(s))))
    }

    pub fn has_bold_run(&self) -> bool {
        self.runs.iter().any(|r| r.bold && !r.text.trim().is_empty())
    }
}

// ── Sections & chunks ───────────────────────────────────────────────────────

/// A bounded, sentence-aligned piece of a section body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based index within the section.
    pub index: usize,
    pub content: String,
}

impl Chunk {
    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

// ── Generation output ───────────────────────────────────────────────────────

/// How a section should be condensed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    /// A single prose summary.
    #[default]
    Summary,
    /// A short list of bullet statements.
    Points,
}

impl std::str::FromStr for SummaryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" | "prose" => Ok(Self::Summary),
            "points" | "bullets" => Ok(Self::Points),
            other => Err(format!("unknown summary mode '{other}' (expected summary|points)")),
        }
    }
}

/// Per-section output of the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryResult {
    Summary(String),
    Points(Vec<String>),
}

/// One entry of the `sections` array: `{heading, summary}` or `{heading, points}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub heading: String,
    #[serde(flatten)]
    pub result: SummaryResult,
}

// ── Multiple-choice questions ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqQuestion {
    pub question: String,
    pub options: McqOptions,
    /// One of "A", "B", "C", "D".
    pub answer: String,
}

impl McqQuestion {
    pub fn has_valid_answer(&self) -> bool {
        matches!(self.answer.trim(), "A" | "B" | "C" | "D")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_filename() {
        assert_eq!(DocumentKind::from_filename("notes.pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_filename("NOTES.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(
            DocumentKind::from_filename("lecture.v2.pptx"),
            Some(DocumentKind::SlideDeck)
        );
        assert_eq!(DocumentKind::from_filename("report.docx"), None);
        assert_eq!(DocumentKind::from_filename("pdf"), None);
    }

    #[test]
    fn block_text_concatenates_and_trims() {
        let block = Block::new(vec![
            TextRun::styled("  Intro", true, Some(28.0)),
            TextRun::plain("duction "),
        ]);
        assert_eq!(block.text(), "Introduction");
        assert_eq!(block.max_font_size(), Some(28.0));
        assert!(block.has_bold_run());
    }

    #[test]
    fn blank_block() {
        assert!(Block::plain("   ").is_blank());
        assert!(Block::default().is_blank());
        assert!(!Block::plain("x").is_blank());
    }

    #[test]
    fn section_summary_serializes_flat() {
        let s = SectionSummary {
            heading: "Intro".into(),
            result: SummaryResult::Summary("Short.".into()),
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v, serde_json::json!({"heading": "Intro", "summary": "Short."}));

        let p = SectionSummary {
            heading: "Intro".into(),
            result: SummaryResult::Points(vec!["One point here.".into()]),
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"heading": "Intro", "points": ["One point here."]})
        );
    }

    #[test]
    fn mcq_roundtrip_uses_letter_keys() {
        let raw = r#"{"question":"Q?","options":{"A":"a","B":"b","C":"c","D":"d"},"answer":"C"}"#;
        let q: McqQuestion = serde_json::from_str(raw).unwrap();
        assert_eq!(q.options.c, "c");
        assert!(q.has_valid_answer());
    }

    #[test]
    fn summary_mode_parse() {
        assert_eq!("points".parse::<SummaryMode>().unwrap(), SummaryMode::Points);
        assert_eq!("Summary".parse::<SummaryMode>().unwrap(), SummaryMode::Summary);
        assert!("essay".parse::<SummaryMode>().is_err());
    }
}
