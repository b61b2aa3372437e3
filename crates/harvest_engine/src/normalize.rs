//! Document normalization: boilerplate stripping, main-content selection,
//! text cleanup, chunking, and link extraction.

use std::collections::HashSet;

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use harvest_core::{
    clean_text, collapse_whitespace, split_text, Chunk, ChunkSettings, CleanSettings,
    ExtractedLink,
};
use harvest_logging::harvest_warn;

use crate::types::{DocumentBody, FetchOutcome, FetchResult, RawDocument};

const DEFAULT_MAX_LINKS: usize = 1_000;

/// Tags whose subtrees never contribute content text.
const SKIP_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "iframe", "svg", "form", "nav", "header",
    "footer", "aside", "button", "select",
];

/// id/class/role fragments that mark structural, non-content containers.
const NOISE_ATTR_KEYWORDS: &[&str] = &[
    "nav", "menu", "footer", "sidebar", "cookie", "consent", "banner", "modal", "popup",
    "breadcrumb", "share", "social",
];

#[derive(Debug, Clone)]
pub struct NormalizeSettings {
    pub chunk: ChunkSettings,
    pub clean: CleanSettings,
    /// Upper bound on links collected from a single document.
    pub max_links_per_document: usize,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            chunk: ChunkSettings::default(),
            clean: CleanSettings::default(),
            max_links_per_document: DEFAULT_MAX_LINKS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("document processing panicked: {0}")]
    Panicked(String),
}

/// Turns fetched documents into chunks and links.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    settings: NormalizeSettings,
}

impl Normalizer {
    pub fn new(settings: NormalizeSettings) -> Self {
        Self { settings }
    }

    /// Turns a successful fetch into chunks plus in-document-unique links.
    /// Failed fetches and per-document normalization failures yield empty
    /// output, never an error.
    pub fn process(&self, result: &FetchResult) -> (Vec<Chunk>, Vec<ExtractedLink>) {
        let FetchOutcome::Fetched(documents) = &result.outcome else {
            return (Vec::new(), Vec::new());
        };
        let mut chunks = Vec::new();
        let mut links = Vec::new();
        for document in documents {
            match self.process_document(document) {
                Ok((doc_chunks, doc_links)) => {
                    chunks.extend(doc_chunks);
                    links.extend(doc_links);
                }
                Err(err) => {
                    harvest_warn!("normalization failed for {}: {err}", document.source_url);
                }
            }
        }
        (chunks, links)
    }

    /// One document, behind a panic fence: a pathological page contributes
    /// zero chunks instead of taking down the run.
    fn process_document(
        &self,
        document: &RawDocument,
    ) -> Result<(Vec<Chunk>, Vec<ExtractedLink>), NormalizeError> {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| match &document.body {
            DocumentBody::Html(html) => self.process_html(html, &document.source_url),
            DocumentBody::PlainText(text) => {
                let cleaned = clean_text(text, &CleanSettings::plain_text());
                if cleaned.is_empty() {
                    harvest_warn!("no indexable text in {}", document.source_url);
                }
                (
                    self.build_chunks(&cleaned, &document.source_url, None),
                    Vec::new(),
                )
            }
        }))
        .map_err(|panic| NormalizeError::Panicked(panic_message(panic.as_ref())))
    }

    fn process_html(&self, html: &str, source_url: &str) -> (Vec<Chunk>, Vec<ExtractedLink>) {
        let document = Html::parse_document(html);
        // Links come from the pre-strip markup: navigation is exactly where
        // many of them live.
        let links = collect_links(&document, source_url, self.settings.max_links_per_document);
        let title = document_title(&document);

        let text = content_region(&document)
            .map(region_text)
            .unwrap_or_default();
        let mut cleaned = clean_text(&text, &self.settings.clean);
        if cleaned.is_empty() {
            // No marked-up region with usable text: take the whole document.
            let text = region_text(document.root_element());
            cleaned = clean_text(&text, &self.settings.clean);
        }
        if cleaned.is_empty() {
            harvest_warn!("no indexable text in {source_url}");
            return (Vec::new(), links);
        }
        (self.build_chunks(&cleaned, source_url, title.as_deref()), links)
    }

    fn build_chunks(&self, cleaned: &str, source_url: &str, title: Option<&str>) -> Vec<Chunk> {
        split_text(cleaned, &self.settings.chunk)
            .into_iter()
            .filter(|piece| !piece.trim().is_empty())
            .enumerate()
            .map(|(index, piece)| Chunk::new(piece, source_url, title, index))
            .collect()
    }
}

fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|title| !title.is_empty())
}

/// Prefers an explicitly marked main-content region; otherwise the densest
/// top-level container stands in for an unmarked one.
fn content_region(document: &Html) -> Option<ElementRef<'_>> {
    for selector in ["main", "article", "[role=\"main\"]", "#content"] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            return Some(element);
        }
    }
    densest_candidate(document)
}

fn densest_candidate(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("body > div, body > section").ok()?;
    document
        .select(&selector)
        .map(|element| (element, region_text(element).len()))
        .filter(|(_, len)| *len > 0)
        .max_by_key(|(_, len)| *len)
        .map(|(element, _)| element)
}

/// Collects the visible text of a region, skipping structural and noise
/// subtrees, with block boundaries preserved as line breaks so the cleaner
/// and chunker can work line- and paragraph-wise.
fn region_text(region: ElementRef<'_>) -> String {
    let mut builder = TextBuilder::default();
    for child in region.children() {
        visit_node(child, &mut builder);
    }
    builder.finish()
}

fn visit_node(node: NodeRef<'_, Node>, out: &mut TextBuilder) {
    match node.value() {
        Node::Text(text) => out.push_text(text),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, out);
            }
        }
        _ => {}
    }
}

fn visit_element(element: ElementRef<'_>, out: &mut TextBuilder) {
    let tag = element.value().name();
    if SKIP_TAGS.contains(&tag) || has_noise_marker(element) {
        return;
    }
    if tag == "br" {
        out.break_line();
        return;
    }
    let boundary = boundary_for(tag);
    out.boundary(boundary);
    for child in element.children() {
        visit_node(child, out);
    }
    out.boundary(boundary);
}

#[derive(Clone, Copy, PartialEq)]
enum Boundary {
    None,
    Line,
    Paragraph,
}

fn boundary_for(tag: &str) -> Boundary {
    match tag {
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li" | "blockquote" | "pre" | "dd"
        | "dt" => Boundary::Paragraph,
        "div" | "section" | "article" | "main" | "table" | "thead" | "tbody" | "tr" | "td"
        | "th" | "ul" | "ol" | "dl" | "figure" | "figcaption" | "address" | "hr" => Boundary::Line,
        _ => Boundary::None,
    }
}

fn has_noise_marker(element: ElementRef<'_>) -> bool {
    let value = element.value();
    ["id", "class", "role"].iter().any(|name| {
        value.attr(name).is_some_and(|attr| {
            let attr = attr.to_ascii_lowercase();
            NOISE_ATTR_KEYWORDS
                .iter()
                .any(|keyword| attr.contains(keyword))
        })
    })
}

#[derive(Default)]
struct TextBuilder {
    buf: String,
    last: Option<char>,
}

impl TextBuilder {
    fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if matches!(self.last, None | Some(' ') | Some('\n')) {
                    continue;
                }
                self.push(' ');
            } else {
                self.push(ch);
            }
        }
    }

    fn break_line(&mut self) {
        if !matches!(self.last, None | Some('\n')) {
            self.push('\n');
        }
    }

    fn boundary(&mut self, boundary: Boundary) {
        match boundary {
            Boundary::None => {}
            Boundary::Line => self.break_line(),
            Boundary::Paragraph => {
                self.break_line();
                // A second newline marks a paragraph break for the chunker.
                if self.last == Some('\n') && !self.buf.ends_with("\n\n") {
                    self.push('\n');
                }
            }
        }
    }

    fn push(&mut self, ch: char) {
        self.buf.push(ch);
        self.last = Some(ch);
    }

    fn finish(self) -> String {
        self.buf.trim_end().to_string()
    }
}

/// Extracts absolute, deduplicated links from raw markup. Used by the
/// crawler to discover same-domain pages before any stripping happens.
pub(crate) fn extract_links(html: &str, source_url: &str, max_links: usize) -> Vec<ExtractedLink> {
    let document = Html::parse_document(html);
    collect_links(&document, source_url, max_links)
}

fn collect_links(document: &Html, source_url: &str, max_links: usize) -> Vec<ExtractedLink> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let base = Url::parse(source_url).ok();
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(mut target) = resolve_href(href, base.as_ref()) else {
            continue;
        };
        if !matches!(target.scheme(), "http" | "https") {
            continue;
        }
        target.set_fragment(None);
        let target = String::from(target);
        if !seen.insert(target.clone()) {
            continue;
        }
        links.push(ExtractedLink {
            source_url: source_url.to_string(),
            target_url: target,
        });
        if links.len() >= max_links {
            harvest_warn!("link cap {max_links} reached for {source_url}; remaining anchors ignored");
            break;
        }
    }
    links
}

/// Resolves an href against the document base, rejecting fragments, query
/// stubs, and scripting pseudo-URLs.
fn resolve_href(raw: &str, base: Option<&Url>) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.and_then(|base| base.join(trimmed).ok())
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
