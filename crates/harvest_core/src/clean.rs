//! Text cleanup between extraction and chunking.

use std::sync::LazyLock;

use regex::Regex;

/// Knobs for line-level cleanup of extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanSettings {
    /// Lines with fewer words than this are dropped as boilerplate.
    pub min_words: usize,
}

impl Default for CleanSettings {
    fn default() -> Self {
        Self { min_words: 3 }
    }
}

impl CleanSettings {
    /// Settings for plain-text sources (CSV rows, raw files), where short
    /// lines are data rather than navigation debris.
    pub fn plain_text() -> Self {
        Self { min_words: 1 }
    }
}

static NOISE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(copyright|©|\(c\))\s",
        r"(?i)^all rights reserved",
        r"(?i)^(back|return|scroll) to top$",
        // Bare timestamps: dates with optional time, or a time of day alone.
        r"^\d{4}-\d{2}-\d{2}([ T]\d{2}:\d{2}(:\d{2})?)?$",
        r"(?i)^\d{1,2}:\d{2}(:\d{2})?\s*(am|pm)?$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("noise pattern compiles"))
    .collect()
});

/// Cleans extracted text line by line: collapses whitespace runs, drops
/// known noise lines and lines under the word-count threshold, and keeps a
/// single blank line between paragraphs so the chunker can snap to them.
pub fn clean_text(raw: &str, settings: &CleanSettings) -> String {
    let mut kept: Vec<String> = Vec::new();
    for line in raw.lines() {
        let line = collapse_whitespace(line);
        if line.is_empty() {
            if matches!(kept.last(), Some(prev) if !prev.is_empty()) {
                kept.push(String::new());
            }
            continue;
        }
        if is_noise_line(&line) {
            continue;
        }
        if word_count(&line) < settings.min_words {
            continue;
        }
        kept.push(line);
    }
    while matches!(kept.last(), Some(last) if last.is_empty()) {
        kept.pop();
    }
    kept.join("\n")
}

/// Collapses all whitespace runs in a line to single spaces and trims it.
pub fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_noise_line(line: &str) -> bool {
    NOISE_PATTERNS.iter().any(|re| re.is_match(line))
}

fn word_count(line: &str) -> usize {
    line.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::{clean_text, collapse_whitespace, CleanSettings};

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(collapse_whitespace("  a \t b   c  "), "a b c");
        assert_eq!(collapse_whitespace("a\t\tb"), "a b");
    }

    #[test]
    fn noise_lines_are_dropped() {
        let raw = "A real sentence with enough words.\nCopyright 2024 Example Corp\nReturn to top\n2024-01-15\n14:30\nAnother real sentence right here.";
        let cleaned = clean_text(&raw, &CleanSettings::default());
        assert_eq!(
            cleaned,
            "A real sentence with enough words.\nAnother real sentence right here."
        );
    }

    #[test]
    fn short_lines_fall_below_word_threshold() {
        let raw = "Menu\nHome\nThis line clearly has enough words to keep.";
        let cleaned = clean_text(&raw, &CleanSettings::default());
        assert_eq!(cleaned, "This line clearly has enough words to keep.");
    }

    #[test]
    fn paragraph_breaks_survive_as_single_blank_lines() {
        let raw = "First paragraph has some words.\n\n\n\nSecond paragraph has some words.";
        let cleaned = clean_text(&raw, &CleanSettings::default());
        assert_eq!(
            cleaned,
            "First paragraph has some words.\n\nSecond paragraph has some words."
        );
    }
}
