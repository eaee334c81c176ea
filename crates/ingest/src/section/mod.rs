//! Heading-based section splitting.
//!
//! Units (PDF lines or slide paragraphs) are classified one at a time. A
//! heading opens a bucket; every other unit is appended to the current bucket,
//! space-separated. Content before the first heading lands in an implicit
//! "Introduction" bucket.

mod classifier;

use indexmap::IndexMap;
use quickprep_core::config::SplitterConfig;
use quickprep_core::Block;
use serde::Serialize;

use crate::document::{ExtractedContent, ExtractedDocument};

pub use classifier::{
    is_all_caps, is_numbered_heading, HeadingClassifier, LineClassifier, ShortLineRule,
    SlideBlockClassifier, BOLD_HEADING_MAX_WORDS, SHORT_HEADING_MAX_WORDS,
};

/// Heading of the bucket that collects text preceding the first heading.
pub const INTRODUCTION: &str = "Introduction";

/// What happens when a heading text repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateHeadingPolicy {
    /// The bucket keeps its original position; its body restarts empty.
    #[default]
    Overwrite,
    /// The bucket keeps its position and later content is appended.
    Append,
}

impl std::str::FromStr for DuplicateHeadingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" | "replace" => Ok(Self::Overwrite),
            "append" | "merge" => Ok(Self::Append),
            other => Err(format!("unknown duplicate heading policy '{other}'")),
        }
    }
}

/// Splitter settings shared by both document kinds.
#[derive(Debug, Clone, Copy)]
pub struct SplitterOptions {
    pub short_line_rule: ShortLineRule,
    pub duplicate_policy: DuplicateHeadingPolicy,
    pub default_font_size: f32,
    pub font_margin: f32,
}

impl Default for SplitterOptions {
    fn default() -> Self {
        Self {
            short_line_rule: ShortLineRule::default(),
            duplicate_policy: DuplicateHeadingPolicy::default(),
            default_font_size: SlideBlockClassifier::DEFAULT_FONT_SIZE,
            font_margin: SlideBlockClassifier::DEFAULT_MARGIN,
        }
    }
}

impl SplitterOptions {
    /// Unrecognized rule names fall back to the defaults with a warning.
    pub fn from_config(config: &SplitterConfig) -> Self {
        let short_line_rule = config.short_line_rule.parse().unwrap_or_else(|e| {
            tracing::warn!("{e}; using default");
            ShortLineRule::default()
        });
        let duplicate_policy = config.duplicate_policy.parse().unwrap_or_else(|e| {
            tracing::warn!("{e}; using default");
            DuplicateHeadingPolicy::default()
        });
        Self {
            short_line_rule,
            duplicate_policy,
            default_font_size: config.default_font_size,
            font_margin: config.font_margin,
        }
    }
}

/// Text accessor for anything the splitter can consume.
pub trait TextUnit {
    fn unit_text(&self) -> String;
}

impl TextUnit for str {
    fn unit_text(&self) -> String {
        self.trim().to_string()
    }
}

impl TextUnit for String {
    fn unit_text(&self) -> String {
        self.trim().to_string()
    }
}

impl TextUnit for Block {
    fn unit_text(&self) -> String {
        self.text()
    }
}

/// Ordered heading → body mapping produced by the splitter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Sections {
    map: IndexMap<String, String>,
    #[serde(skip)]
    duplicate_headings: Vec<String>,
    #[serde(skip)]
    policy: DuplicateHeadingPolicy,
    /// The Introduction bucket exists but no heading has named it yet.
    #[serde(skip)]
    implicit_introduction: bool,
}

impl Sections {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, heading: &str) -> Option<&str> {
        self.map.get(heading).map(String::as_str)
    }

    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// `(heading, body)` pairs in first-seen heading order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(h, b)| (h.as_str(), b.as_str()))
    }

    /// Sections whose body has any text.
    pub fn non_empty(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(_, body)| !body.trim().is_empty())
    }

    /// Heading texts that occurred more than once, in the order collisions happened.
    pub fn duplicate_headings(&self) -> &[String] {
        &self.duplicate_headings
    }

    /// One human-readable message per heading collision.
    pub fn warnings(&self) -> Vec<String> {
        let outcome = match self.policy {
            DuplicateHeadingPolicy::Overwrite => {
                "only the text after its last occurrence was kept"
            }
            DuplicateHeadingPolicy::Append => "text from every occurrence was combined",
        };
        self.duplicate_headings
            .iter()
            .map(|h| format!("Heading \"{h}\" appears more than once; {outcome}"))
            .collect()
    }

    fn with_policy(policy: DuplicateHeadingPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    fn open(&mut self, heading: String) {
        // A heading literally named "Introduction" adopts the preamble bucket.
        if self.implicit_introduction && heading == INTRODUCTION {
            self.implicit_introduction = false;
            return;
        }
        match self.map.get_mut(&heading) {
            Some(body) => {
                tracing::warn!(heading = %heading, policy = ?self.policy, "Duplicate heading");
                if self.policy == DuplicateHeadingPolicy::Overwrite {
                    body.clear();
                }
                self.duplicate_headings.push(heading);
            }
            None => {
                self.map.insert(heading, String::new());
            }
        }
    }

    fn open_introduction(&mut self) {
        if !self.map.contains_key(INTRODUCTION) {
            self.map.insert(INTRODUCTION.to_string(), String::new());
            self.implicit_introduction = true;
        }
    }

    fn append(&mut self, heading: &str, text: &str) {
        let body = self.map.entry(heading.to_string()).or_default();
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(text);
    }
}

/// Split units into sections using `classifier`.
pub fn split_sections<'a, U, C, I>(units: I, classifier: &C, policy: DuplicateHeadingPolicy) -> Sections
where
    U: TextUnit + ?Sized + 'a,
    C: HeadingClassifier<U> + ?Sized,
    I: IntoIterator<Item = &'a U>,
{
    let mut sections = Sections::with_policy(policy);
    let mut current: Option<String> = None;

    for unit in units {
        let text = unit.unit_text();
        if text.is_empty() {
            continue;
        }

        if classifier.is_heading(unit, &text) {
            sections.open(text.clone());
            current = Some(text);
        } else {
            let heading = current.get_or_insert_with(|| {
                sections.open_introduction();
                INTRODUCTION.to_string()
            });
            sections.append(heading, &text);
        }
    }

    sections
}

/// Split flat PDF text line by line.
pub fn split_pdf_text(text: &str, options: &SplitterOptions) -> Sections {
    let classifier = LineClassifier::new(options.short_line_rule);
    split_sections(text.lines(), &classifier, options.duplicate_policy)
}

/// Split slide paragraphs, classifying against the deck's average font size.
pub fn split_slide_blocks(blocks: &[Block], options: &SplitterOptions) -> Sections {
    let classifier =
        SlideBlockClassifier::from_blocks(blocks, options.default_font_size, options.font_margin);
    tracing::debug!(
        average_font_size = classifier.average_font_size,
        blocks = blocks.len(),
        "Splitting slide deck"
    );
    split_sections(blocks, &classifier, options.duplicate_policy)
}

/// Split whatever the extractor produced with the matching classifier.
pub fn split_extracted(doc: &ExtractedDocument, options: &SplitterOptions) -> Sections {
    match &doc.content {
        ExtractedContent::Text(text) => split_pdf_text(text, options),
        ExtractedContent::Blocks(blocks) => split_slide_blocks(blocks, options),
    }
}
