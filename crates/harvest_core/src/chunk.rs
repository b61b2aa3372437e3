//! Overlapping chunk splitting for normalized text.

use serde::{Deserialize, Serialize};

/// Splitter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    /// Target maximum chunk size, in characters.
    pub target_size: usize,
    /// Characters of trailing context repeated at the start of the next
    /// chunk.
    pub overlap: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            target_size: 1000,
            overlap: 200,
        }
    }
}

/// One bounded slice of normalized text plus source attribution: the atomic
/// unit handed to the chunk sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Normalized text. Never empty.
    pub content: String,
    /// The URL the text came from. Never empty.
    pub source_url: String,
    /// Page title, when one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_title: Option<String>,
    /// Zero-based position within the source document, strictly increasing.
    pub index: usize,
    /// Character count of `content`.
    pub length: usize,
}

impl Chunk {
    /// Builds a chunk, deriving `length` from the content.
    pub fn new(content: String, source_url: &str, source_title: Option<&str>, index: usize) -> Self {
        let length = content.chars().count();
        Self {
            content,
            source_url: source_url.to_string(),
            source_title: source_title.map(ToOwned::to_owned),
            index,
            length,
        }
    }
}

/// Splits cleaned text into overlapping windows, snapping each cut to a
/// paragraph, sentence, or word boundary near the target size when one
/// exists in the closing stretch of the window. Text at or under the target
/// size comes back as a single chunk, which is also the only case where a
/// chunk can carry an unbroken run longer than any boundary would allow.
pub fn split_text(text: &str, settings: &ChunkSettings) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let target = settings.target_size.max(1);
    // The step from one window to the next must stay positive.
    let overlap = settings.overlap.min(target.saturating_sub(1));

    let chars: Vec<char> = text.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0usize;
    loop {
        let hard_end = (start + target).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            snap_boundary(&chars, start, hard_end)
        };
        pieces.push(chars[start..end].iter().collect::<String>());
        if end == chars.len() {
            break;
        }
        // Step back by the overlap, but always move forward overall.
        start = end.saturating_sub(overlap).max(start + 1);
    }
    pieces
}

/// Picks the cut position for a window ending at `hard_end`: a paragraph
/// break wins, then a line break, then a sentence end, then any whitespace,
/// searching backward through the last two fifths of the window.
fn snap_boundary(chars: &[char], start: usize, hard_end: usize) -> usize {
    let window_start = start + (hard_end - start) * 3 / 5;
    let mut line_break = None;
    let mut sentence_end = None;
    let mut word_break = None;
    for i in ((window_start + 1)..=hard_end).rev() {
        let c = chars[i - 1];
        if c == '\n' {
            if i >= 2 && chars[i - 2] == '\n' {
                return i;
            }
            line_break.get_or_insert(i);
        } else if matches!(c, '.' | '!' | '?')
            && chars.get(i).is_none_or(|next| next.is_whitespace())
        {
            sentence_end.get_or_insert(i);
        } else if c.is_whitespace() {
            word_break.get_or_insert(i);
        }
    }
    line_break
        .or(sentence_end)
        .or(word_break)
        .unwrap_or(hard_end)
}
