//! Script-aware segmentation and line-preserving chunking.
//!
//! Everything here is a pure function over `\n`-separated lines, so
//! `segment(text)` joined back with `\n` reproduces `text` exactly, and
//! `chunk(segment, n)` joined with `\n` reproduces the segment.

use serde::{Deserialize, Serialize};

/// Scripts the translator can be pointed at. Each maps to one Unicode block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetScript {
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Oriya,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Arabic,
}

impl TargetScript {
    pub fn range(self) -> (char, char) {
        match self {
            TargetScript::Devanagari => ('\u{0900}', '\u{097F}'),
            TargetScript::Bengali => ('\u{0980}', '\u{09FF}'),
            TargetScript::Gurmukhi => ('\u{0A00}', '\u{0A7F}'),
            TargetScript::Gujarati => ('\u{0A80}', '\u{0AFF}'),
            TargetScript::Oriya => ('\u{0B00}', '\u{0B7F}'),
            TargetScript::Tamil => ('\u{0B80}', '\u{0BFF}'),
            TargetScript::Telugu => ('\u{0C00}', '\u{0C7F}'),
            TargetScript::Kannada => ('\u{0C80}', '\u{0CFF}'),
            TargetScript::Malayalam => ('\u{0D00}', '\u{0D7F}'),
            TargetScript::Arabic => ('\u{0600}', '\u{06FF}'),
        }
    }

    pub fn contains(self, ch: char) -> bool {
        let (lo, hi) = self.range();
        (lo..=hi).contains(&ch)
    }

    /// True when at least one character of `text` belongs to the script.
    pub fn matches(self, text: &str) -> bool {
        text.chars().any(|c| self.contains(c))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub is_target_script: bool,
    pub text: String,
}

/// Groups consecutive lines sharing a script classification.
pub fn segment(text: &str, script: TargetScript) -> Vec<Segment> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut current: Option<bool> = None;

    for line in text.split('\n') {
        let flag = script.matches(line);
        match current {
            Some(c) if c != flag => {
                segments.push(Segment {
                    is_target_script: c,
                    text: buffer.join("\n"),
                });
                buffer.clear();
            }
            _ => {}
        }
        current = Some(flag);
        buffer.push(line);
    }

    if let Some(c) = current {
        segments.push(Segment {
            is_target_script: c,
            text: buffer.join("\n"),
        });
    }
    segments
}

/// Greedily packs whole lines into chunks of at most `max_chars` characters.
/// A single line longer than the budget is emitted alone, unsplit.
pub fn chunk(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        if !current.is_empty() && current_len + 1 + line_len > max_chars {
            chunks.push(current.join("\n"));
            current.clear();
            current_len = 0;
        }
        if current.is_empty() {
            current_len = line_len;
        } else {
            current_len += 1 + line_len;
        }
        current.push(line);
    }

    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
    chunks
}

/// Fixed-size groups, last one possibly shorter. A zero size is treated as one.
pub fn batches<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}
