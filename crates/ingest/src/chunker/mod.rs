//! Sentence-aligned chunking of section bodies.
//!
//! Whole sentences are packed greedily, space-joined, until the next one would
//! push the chunk past `max_chars`. A sentence longer than the limit becomes a
//! chunk of its own rather than being cut mid-word.

use std::sync::Arc;

use quickprep_core::config::PipelineConfig;
use quickprep_core::text::split_sentences;
use quickprep_core::Chunk;

/// Configuration for the chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum characters per chunk (default: 800).
    pub max_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { max_chars: 800 }
    }
}

impl ChunkConfig {
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            max_chars: config.max_chunk_chars.max(1),
        }
    }
}

/// Lazy iterator over the chunks of one body.
///
/// Cloning yields an independent iterator from the same position; `rewind`
/// starts over from the first chunk.
#[derive(Debug, Clone)]
pub struct Chunks {
    sentences: Arc<[String]>,
    max_chars: usize,
    next_sentence: usize,
    next_index: usize,
}

impl Chunks {
    pub fn new(text: &str, config: ChunkConfig) -> Self {
        Self {
            sentences: split_sentences(text).into(),
            max_chars: config.max_chars.max(1),
            next_sentence: 0,
            next_index: 0,
        }
    }

    pub fn rewind(&mut self) {
        self.next_sentence = 0;
        self.next_index = 0;
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let first = self.sentences.get(self.next_sentence)?;
        let mut content = first.clone();
        let mut len = first.chars().count();
        self.next_sentence += 1;

        while let Some(sentence) = self.sentences.get(self.next_sentence) {
            let sentence_len = sentence.chars().count();
            if len + 1 + sentence_len > self.max_chars {
                break;
            }
            content.push(' ');
            content.push_str(sentence);
            len += 1 + sentence_len;
            self.next_sentence += 1;
        }

        let chunk = Chunk {
            index: self.next_index,
            content,
        };
        self.next_index += 1;
        Some(chunk)
    }
}

/// Chunk `text` with the given configuration.
pub fn chunk_text(text: &str, config: ChunkConfig) -> Chunks {
    Chunks::new(text, config)
}
