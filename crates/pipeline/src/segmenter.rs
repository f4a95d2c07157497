//! Text segmentation for synthesis
//!
//! Splits arbitrary-length text into chunks the model can take in one call.
//! Sentences are packed greedily up to the length cap; over-long sentences
//! fall back to clause boundaries (`,` `;`) and then to words. A single word
//! longer than the cap is emitted whole.
//!
//! Boundaries are only taken where punctuation is followed by whitespace
//! (closing quotes and brackets may sit in between), so numbers such as
//! `3.14` or `1,000` and abbreviations such as `U.S.A` stay intact and no
//! word is ever cut.

use std::fmt;

/// Default maximum characters per chunk
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 500;

/// A bounded piece of text submitted to the model in one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk(String);

impl Chunk {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Chunk {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits text into chunks of at most `max_length` characters
#[derive(Debug, Clone, Copy)]
pub struct TextSegmenter {
    max_length: usize,
}

impl TextSegmenter {
    /// Create a segmenter; a zero limit is raised to one
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.max(1),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Segment text into ordered chunks
    ///
    /// Total over every input; empty or blank text yields no chunks.
    pub fn segment(&self, text: &str) -> Vec<Chunk> {
        let mut builder = ChunkBuilder::new(self.max_length);

        for sentence in split_after(text, is_sentence_terminator) {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }

            if char_len(sentence) <= self.max_length {
                builder.push(sentence);
                continue;
            }

            builder.flush();
            for clause in split_after(sentence, is_clause_delimiter) {
                let clause = clause.trim();
                if clause.is_empty() {
                    continue;
                }

                if char_len(clause) <= self.max_length {
                    builder.push(clause);
                } else {
                    // word-chunks stand alone
                    builder.flush();
                    for word in clause.split_whitespace() {
                        builder.push(word);
                    }
                    builder.flush();
                }
            }
        }

        builder.finish()
    }
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_LENGTH)
    }
}

/// Segment text with the given length cap
pub fn segment(text: &str, max_length: usize) -> Vec<Chunk> {
    TextSegmenter::new(max_length).segment(text)
}

/// Greedy accumulator: joins pieces with one space until the cap is hit
struct ChunkBuilder {
    max_length: usize,
    pending: String,
    pending_len: usize,
    chunks: Vec<Chunk>,
}

impl ChunkBuilder {
    fn new(max_length: usize) -> Self {
        Self {
            max_length,
            pending: String::new(),
            pending_len: 0,
            chunks: Vec::new(),
        }
    }

    /// Append a trimmed, non-empty piece, flushing first if it would not fit
    fn push(&mut self, piece: &str) {
        let len = char_len(piece);

        if !self.pending.is_empty() && self.pending_len + 1 + len > self.max_length {
            self.flush();
        }

        if !self.pending.is_empty() {
            self.pending.push(' ');
            self.pending_len += 1;
        }
        self.pending.push_str(piece);
        self.pending_len += len;
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        self.pending_len = 0;

        let text = text.trim();
        if !text.is_empty() {
            self.chunks.push(Chunk(text.to_string()));
        }
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Split `text` right after each delimiter run that is followed by whitespace
///
/// The delimiter stays with the preceding part; the whitespace starts the next.
fn split_after(text: &str, is_delimiter: fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut after_delimiter = false;

    for (i, c) in text.char_indices() {
        if after_delimiter && c.is_whitespace() {
            parts.push(&text[start..i]);
            start = i;
            after_delimiter = false;
            continue;
        }

        if is_delimiter(c) {
            after_delimiter = true;
        } else if !(after_delimiter && is_closing_mark(c)) {
            after_delimiter = false;
        }
    }

    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_clause_delimiter(c: char) -> bool {
    matches!(c, ',' | ';')
}

fn is_closing_mark(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '}' | '\u{201D}' | '\u{2019}' | '\u{00BB}')
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
