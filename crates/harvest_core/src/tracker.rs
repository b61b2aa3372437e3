//! In-memory link tracking: append-only, unique per (source, target) pair.

use std::collections::{BTreeMap, HashSet};

/// A link discovered inside a harvested document, already resolved to an
/// absolute target URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractedLink {
    /// Page the link was found on.
    pub source_url: String,
    /// Absolute link target.
    pub target_url: String,
}

/// Deduplicating store for links discovered during one run. Pairs are only
/// ever added; flushing to disk is the engine's job.
#[derive(Debug, Default)]
pub struct LinkTracker {
    seen: HashSet<(String, String)>,
    entries: Vec<ExtractedLink>,
}

impl LinkTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pair; returns `true` only the first time it is seen.
    pub fn add(&mut self, source: &str, target: &str) -> bool {
        if !self.seen.insert((source.to_string(), target.to_string())) {
            return false;
        }
        self.entries.push(ExtractedLink {
            source_url: source.to_string(),
            target_url: target.to_string(),
        });
        true
    }

    /// Number of unique pairs tracked so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Link counts grouped by source URL, in stable (sorted) order.
    pub fn summary(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for link in &self.entries {
            *counts.entry(link.source_url.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// All tracked pairs, in insertion order.
    pub fn entries(&self) -> &[ExtractedLink] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::LinkTracker;

    #[test]
    fn add_returns_true_exactly_once_per_pair() {
        let mut tracker = LinkTracker::new();
        assert!(tracker.add("https://a.example/", "https://b.example/"));
        assert!(!tracker.add("https://a.example/", "https://b.example/"));
        assert!(!tracker.add("https://a.example/", "https://b.example/"));
        assert!(tracker.add("https://a.example/", "https://c.example/"));
        assert!(tracker.add("https://b.example/", "https://b.example/"));
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn summary_groups_by_source() {
        let mut tracker = LinkTracker::new();
        tracker.add("https://a.example/", "https://x.example/");
        tracker.add("https://a.example/", "https://y.example/");
        tracker.add("https://b.example/", "https://x.example/");
        let summary = tracker.summary();
        assert_eq!(summary["https://a.example/"], 2);
        assert_eq!(summary["https://b.example/"], 1);
    }
}
