//! Heading heuristics for the two kinds of text units.

use std::sync::OnceLock;

use quickprep_core::text::word_count;
use quickprep_core::Block;
use regex::Regex;

/// Decides whether a unit of text opens a new section.
///
/// `text` is the unit's trimmed, non-empty text, computed once by the splitter.
pub trait HeadingClassifier<U: ?Sized> {
    fn is_heading(&self, unit: &U, text: &str) -> bool;
}

/// Words allowed in a short heading line.
pub const SHORT_HEADING_MAX_WORDS: usize = 6;
/// Words allowed in a bold slide heading.
pub const BOLD_HEADING_MAX_WORDS: usize = 15;

/// Terminal condition paired with the word limit of the short-line rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShortLineRule {
    /// Short lines that do not end with '.' are headings.
    #[default]
    NoTerminalPeriod,
    /// Short lines that end with ':' are headings.
    TrailingColon,
}

impl ShortLineRule {
    fn matches(&self, text: &str) -> bool {
        match self {
            Self::NoTerminalPeriod => !text.ends_with('.'),
            Self::TrailingColon => text.ends_with(':'),
        }
    }
}

impl std::str::FromStr for ShortLineRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "no_terminal_period" | "no_period" => Ok(Self::NoTerminalPeriod),
            "trailing_colon" | "colon" => Ok(Self::TrailingColon),
            other => Err(format!("unknown short-line rule '{other}'")),
        }
    }
}

/// At least one cased character, and every cased character uppercase.
pub fn is_all_caps(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

fn numbered_outline() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)*\s+.+").ok()).as_ref()
}

/// Outline numbering such as `2.1 Motivation`.
pub fn is_numbered_heading(text: &str) -> bool {
    numbered_outline().is_some_and(|re| re.is_match(text))
}

// ── PDF lines ───────────────────────────────────────────────────────────────

/// Heading rules for plain text lines, which carry no formatting.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineClassifier {
    pub short_line_rule: ShortLineRule,
}

impl LineClassifier {
    pub fn new(short_line_rule: ShortLineRule) -> Self {
        Self { short_line_rule }
    }

    pub fn is_heading_text(&self, text: &str) -> bool {
        is_all_caps(text)
            || is_numbered_heading(text)
            || (word_count(text) <= SHORT_HEADING_MAX_WORDS && self.short_line_rule.matches(text))
    }
}

impl HeadingClassifier<str> for LineClassifier {
    fn is_heading(&self, _unit: &str, text: &str) -> bool {
        self.is_heading_text(text)
    }
}

// ── Slide blocks ────────────────────────────────────────────────────────────

/// Heading rules for slide paragraphs, using run font size and weight.
#[derive(Debug, Clone, Copy)]
pub struct SlideBlockClassifier {
    /// Mean font size over every sized run in the deck.
    pub average_font_size: f32,
    pub font_margin: f32,
}

impl SlideBlockClassifier {
    pub const DEFAULT_FONT_SIZE: f32 = 18.0;
    pub const DEFAULT_MARGIN: f32 = 1.0;

    /// Derive the average font size from all sized runs in `blocks`, or use
    /// `default_font_size` when none carry a size.
    pub fn from_blocks(blocks: &[Block], default_font_size: f32, font_margin: f32) -> Self {
        let sizes: Vec<f32> = blocks
            .iter()
            .flat_map(|b| b.runs.iter())
            .filter_map(|r| r.font_size)
            .collect();
        let average_font_size = if sizes.is_empty() {
            default_font_size
        } else {
            sizes.iter().sum::<f32>() / sizes.len() as f32
        };
        Self {
            average_font_size,
            font_margin,
        }
    }
}

impl Default for SlideBlockClassifier {
    fn default() -> Self {
        Self {
            average_font_size: Self::DEFAULT_FONT_SIZE,
            font_margin: Self::DEFAULT_MARGIN,
        }
    }
}

impl HeadingClassifier<Block> for SlideBlockClassifier {
    fn is_heading(&self, unit: &Block, text: &str) -> bool {
        let words = word_count(text);
        let large = unit
            .max_font_size()
            .is_some_and(|size| size > self.average_font_size + self.font_margin);
        let bold_and_brief = unit.has_bold_run() && words <= BOLD_HEADING_MAX_WORDS;
        let short = words <= SHORT_HEADING_MAX_WORDS && !text.ends_with('.');
        large || bold_and_brief || short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickprep_core::TextRun;

    #[test]
    fn all_caps_ignores_non_alphabetic() {
        assert!(is_all_caps("INTRODUCTION"));
        assert!(is_all_caps("RESULTS: 2024!"));
        assert!(!is_all_caps("2024 - 2025"));
        assert!(!is_all_caps("Results"));
    }

    #[test]
    fn numbered_outline_pattern() {
        assert!(is_numbered_heading("2.1 Motivation"));
        assert!(is_numbered_heading("3 Results and a rather long discussion of everything."));
        assert!(!is_numbered_heading("2.1"));
        assert!(!is_numbered_heading("v2.1 Motivation"));
    }

    #[test]
    fn line_rules() {
        let c = LineClassifier::default();
        assert!(c.is_heading_text("CONCLUSION"));
        assert!(c.is_heading_text("Background and context"));
        assert!(!c.is_heading_text("Final thought here."));
        assert!(!c.is_heading_text("This is body text. It has two sentences."));
        assert!(!c.is_heading_text("this line has seven words and no period"));
    }

    #[test]
    fn trailing_colon_rule() {
        let c = LineClassifier::new(ShortLineRule::TrailingColon);
        assert!(c.is_heading_text("Key ideas:"));
        assert!(!c.is_heading_text("Background and context"));
        assert!(c.is_heading_text("1.2 Background and context"));
    }

    #[test]
    fn short_line_rule_parse() {
        assert_eq!("trailing-colon".parse::<ShortLineRule>().unwrap(), ShortLineRule::TrailingColon);
        assert_eq!(
            "no_terminal_period".parse::<ShortLineRule>().unwrap(),
            ShortLineRule::NoTerminalPeriod
        );
        assert!("sometimes".parse::<ShortLineRule>().is_err());
    }

    fn body(text: &str, size: f32) -> Block {
        Block::new(vec![TextRun::styled(text, false, Some(size))])
    }

    #[test]
    fn slide_average_font_size() {
        let blocks = vec![body("a", 20.0), body("b", 10.0), Block::plain("unsized")];
        let c = SlideBlockClassifier::from_blocks(&blocks, 18.0, 1.0);
        assert!((c.average_font_size - 15.0).abs() < f32::EPSILON);

        let c = SlideBlockClassifier::from_blocks(&[Block::plain("x")], 18.0, 1.0);
        assert!((c.average_font_size - 18.0).abs() < f32::EPSILON);
    }

    #[test]
    fn slide_rules() {
        let c = SlideBlockClassifier {
            average_font_size: 18.0,
            font_margin: 1.0,
        };
        let long_sentence = "This body paragraph runs on for well over six words and ends properly.";

        let big = body(long_sentence, 28.0);
        assert!(c.is_heading(&big, &big.text()));

        // Exactly at the margin is not enough.
        let edge = body(long_sentence, 19.0);
        assert!(!c.is_heading(&edge, &edge.text()));

        let bold = Block::new(vec![TextRun::styled(long_sentence, true, Some(18.0))]);
        assert!(c.is_heading(&bold, &bold.text()));

        let short = body("Agenda", 18.0);
        assert!(c.is_heading(&short, &short.text()));

        let plain = body(long_sentence, 18.0);
        assert!(!c.is_heading(&plain, &plain.text()));
    }
}
