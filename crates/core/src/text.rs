//! Plain-text helpers shared by the ingest and generation stages.

/// Abbreviations whose trailing period never ends a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "vs", "e.g", "i.e", "fig", "vol", "approx",
    "dept", "inc", "ltd",
];

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

fn can_open_sentence(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '(' | '[' | '\u{201C}' | '\u{2018}')
}

/// Start index of the whitespace-delimited word ending at `end` (exclusive).
fn word_start(chars: &[char], end: usize) -> usize {
    let mut start = end;
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    start
}

/// A single capital letter followed by a period, like "J.".
fn is_initial(word: &[char]) -> bool {
    let word: Vec<char> = word
        .iter()
        .copied()
        .skip_while(|c| !c.is_alphanumeric())
        .collect();
    matches!(word.as_slice(), [c, '.'] if c.is_uppercase())
}

fn initial_at(chars: &[char], from: usize) -> bool {
    let mut end = from;
    while end < chars.len() && !chars[end].is_whitespace() {
        end += 1;
    }
    is_initial(&chars[from..end])
}

fn initial_before(chars: &[char], start: usize) -> bool {
    let mut end = start;
    while end > 0 && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    end > 0 && is_initial(&chars[word_start(chars, end)..end])
}

/// Whether the '.' at `dot` belongs to an abbreviation or an initial rather
/// than ending the sentence that began at `sentence_start`.
///
/// An initial only counts when it opens the sentence or sits next to another
/// initial ("J. Doe", "J. R. Tolkien"); "vitamin A. It" still splits.
fn period_continues(chars: &[char], dot: usize, next: usize, sentence_start: usize) -> bool {
    let start = word_start(chars, dot);
    let word: String = chars[start..dot].iter().collect();
    let word = word.trim_start_matches(|c: char| !c.is_alphanumeric());
    if ABBREVIATIONS.contains(&word.to_lowercase().as_str()) {
        return true;
    }
    if !is_initial(&chars[start..=dot]) {
        return false;
    }
    start <= sentence_start || initial_before(chars, start) || initial_at(chars, next)
}

/// Split text into sentences.
///
/// A boundary is terminal punctuation (`.`, `!`, `?`, possibly repeated and
/// followed by closing quotes or brackets), then whitespace, then a character
/// that can open a sentence. Returns trimmed, non-empty sentences in order.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !is_terminal(chars[i]) {
            i += 1;
            continue;
        }

        let punct_at = i;
        let mut end = i + 1;
        while end < chars.len() && (is_terminal(chars[end]) || is_closer(chars[end])) {
            end += 1;
        }

        let mut next = end;
        while next < chars.len() && chars[next].is_whitespace() {
            next += 1;
        }

        let boundary = next > end
            && next < chars.len()
            && can_open_sentence(chars[next])
            && !(chars[punct_at] == '.' && period_continues(&chars, punct_at, next, start));

        if boundary {
            let sentence: String = chars[start..end].iter().collect();
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = next;
            i = next;
        } else {
            i = end;
        }
    }

    if start < chars.len() {
        let tail: String = chars[start..].iter().collect();
        let tail = tail.trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
    }
    sentences
}

/// Collapse every run of whitespace (newlines included) into one space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean generated text: runs of newlines, bullet glyphs and dashes become a
/// single space, then whitespace is collapsed.
pub fn sanitize_generated(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '•' | '-' | '\u{2013}' | '\u{2014}' | '*' => ' ',
            other => other,
        })
        .collect();
    normalize_whitespace(&replaced)
}

/// Number of whitespace-delimited words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Truncate to at most `max_chars` Unicode scalar values, never splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_sentences() {
        let s = split_sentences("This is body text. It has two sentences.");
        assert_eq!(s, vec!["This is body text.", "It has two sentences."]);
    }

    #[test]
    fn keeps_decimals_and_lowercase_continuations() {
        let s = split_sentences("Pi is 3.14 roughly. then lowercase follows. Next one!");
        assert_eq!(s, vec!["Pi is 3.14 roughly. then lowercase follows.", "Next one!"]);
    }

    #[test]
    fn respects_abbreviations_and_initials() {
        let s = split_sentences("Ask Dr. Smith about it. J. Doe agreed. Done.");
        assert_eq!(s, vec!["Ask Dr. Smith about it.", "J. Doe agreed.", "Done."]);
    }

    #[test]
    fn common_words_and_etc_still_end_sentences() {
        let s = split_sentences(
            "The answer was no. Costs rose sharply. We bought apples, pears, etc. Then we left. \
             Take vitamin A. It helps.",
        );
        assert_eq!(
            s,
            vec![
                "The answer was no.",
                "Costs rose sharply.",
                "We bought apples, pears, etc.",
                "Then we left.",
                "Take vitamin A.",
                "It helps.",
            ]
        );
    }

    #[test]
    fn chained_initials_stay_together() {
        let s = split_sentences("Written by J. R. R. Tolkien in England. It sold well.");
        assert_eq!(s, vec!["Written by J. R. R. Tolkien in England.", "It sold well."]);
    }

    #[test]
    fn etc_before_lowercase_continues() {
        let s = split_sentences("Bring pens, paper, etc. and a calculator. Then sit.");
        assert_eq!(s, vec!["Bring pens, paper, etc. and a calculator.", "Then sit."]);
    }

    #[test]
    fn handles_closing_quotes_and_multiple_terminals() {
        let s = split_sentences("He said \"stop.\" Then left?! Why");
        assert_eq!(s, vec!["He said \"stop.\"", "Then left?!", "Why"]);
    }

    #[test]
    fn empty_and_whitespace_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n ").is_empty());
    }

    #[test]
    fn no_text_is_lost() {
        let input = "One. Two three. Four? Five! six";
        let joined = split_sentences(input).join(" ");
        assert_eq!(joined, input);
    }

    #[test]
    fn normalize_collapses_newlines_and_spaces() {
        assert_eq!(normalize_whitespace("a\n\n b\t\tc  "), "a b c");
    }

    #[test]
    fn sanitize_strips_bullets_and_dashes() {
        let raw = "• First point\n- second point\n\n— third";
        assert_eq!(sanitize_generated(raw), "First point second point third");
    }

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn counts_words() {
        assert_eq!(word_count("  2.1   Motivation "), 2);
        assert_eq!(word_count(""), 0);
    }
}
