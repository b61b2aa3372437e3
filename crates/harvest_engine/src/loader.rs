//! Loader-strategy selection.
//!
//! One dispatch function consumes the routing decision and executes the
//! matching retrieval strategy, first match wins: skip, blob rewrite,
//! recursive crawl, CSV rows, render, static. Every outcome, errors
//! included, comes back as a [`FetchResult`] value, so one bad URL can
//! never abort a batch run.

use std::time::Duration;

use tokio::time::Instant;
use url::Url;

use harvest_core::RoutingDecision;
use harvest_logging::harvest_debug;

use crate::crawl::crawl;
use crate::decode::decode_text;
use crate::fetch::{FetchSettings, PageFetcher, StaticFetcher};
use crate::render::{RenderClient, RenderSettings};
use crate::rows::csv_to_lines;
use crate::types::{
    DocumentBody, FailureKind, FetchFailure, FetchOutput, FetchResult, LoaderKind, RawDocument,
};

#[derive(Debug, Clone)]
pub struct LoaderSettings {
    /// Fixed delay enforced between consecutive network calls, all
    /// strategies except skip. Upstream throttling makes this a
    /// correctness requirement, not a tuning knob.
    pub request_delay: Duration,
    /// Upper bound on pages fetched by one recursive crawl.
    pub crawl_page_limit: usize,
    pub fetch: FetchSettings,
    pub render: RenderSettings,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_secs(2),
            crawl_page_limit: 200,
            fetch: FetchSettings::default(),
            render: RenderSettings::default(),
        }
    }
}

/// Enforces the shared inter-request delay. One instance throttles every
/// outbound call of a run uniformly, which is why processing stays
/// sequential.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay, last: None }
    }

    /// Sleeps out whatever remains of the delay since the previous network
    /// call, then stamps the clock for the next one.
    pub async fn pause(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                tokio::time::sleep(self.delay - elapsed).await;
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Executes the retrieval strategy selected by a routing decision.
pub struct LoaderSelect {
    static_fetcher: StaticFetcher,
    render_client: RenderClient,
    limiter: RateLimiter,
    crawl_page_limit: usize,
}

impl LoaderSelect {
    pub fn new(settings: LoaderSettings) -> Self {
        Self {
            static_fetcher: StaticFetcher::new(settings.fetch),
            render_client: RenderClient::new(settings.render),
            limiter: RateLimiter::new(settings.request_delay),
            crawl_page_limit: settings.crawl_page_limit,
        }
    }

    /// Resolves and executes the loader strategy for one URL. The retry
    /// pass forces the render loader for everything except skip entries,
    /// which stay skipped.
    pub async fn fetch(
        &mut self,
        url: &str,
        decision: RoutingDecision,
        retry_pass: bool,
    ) -> FetchResult {
        if decision == RoutingDecision::Skip {
            // No network call, no rate-limit stamp.
            return FetchResult::failed(
                url,
                LoaderKind::Skip,
                FetchFailure::new(FailureKind::Skipped, "listed in the skip configuration"),
            );
        }

        if let Some(raw_url) = rewrite_blob_url(url) {
            harvest_debug!("rewrote blob viewer url {url} -> {raw_url}");
            self.limiter.pause().await;
            return match self.static_fetcher.fetch_page(&raw_url).await {
                Ok(output) => self.into_result(url, LoaderKind::RawBlob, output, BodyHint::PlainText),
                Err(failure) => FetchResult::failed(url, LoaderKind::RawBlob, failure),
            };
        }

        if let RoutingDecision::Recursive { depth } = decision {
            return match crawl(
                url,
                depth,
                &self.static_fetcher,
                &mut self.limiter,
                self.crawl_page_limit,
            )
            .await
            {
                Ok(documents) => FetchResult::fetched(url, LoaderKind::RecursiveCrawl, documents),
                Err(failure) => FetchResult::failed(url, LoaderKind::RecursiveCrawl, failure),
            };
        }

        if has_csv_extension(url) {
            self.limiter.pause().await;
            return match self.static_fetcher.fetch_page(url).await {
                Ok(output) => self.into_result(url, LoaderKind::CsvRows, output, BodyHint::Csv),
                Err(failure) => FetchResult::failed(url, LoaderKind::CsvRows, failure),
            };
        }

        if decision == RoutingDecision::ForceRender || retry_pass {
            self.limiter.pause().await;
            return match self.render_client.fetch_page(url).await {
                Ok(output) => self.into_result(url, LoaderKind::Render, output, BodyHint::Auto),
                Err(failure) => FetchResult::failed(url, LoaderKind::Render, failure),
            };
        }

        self.limiter.pause().await;
        match self.static_fetcher.fetch_page(url).await {
            Ok(output) => self.into_result(url, LoaderKind::Static, output, BodyHint::Auto),
            Err(failure) => FetchResult::failed(url, LoaderKind::Static, failure),
        }
    }

    fn into_result(
        &self,
        url: &str,
        loader: LoaderKind,
        output: FetchOutput,
        hint: BodyHint,
    ) -> FetchResult {
        match document_from_output(url, output, hint) {
            Ok(document) => FetchResult::fetched(url, loader, vec![document]),
            Err(failure) => FetchResult::failed(url, loader, failure),
        }
    }
}

/// How to interpret fetched bytes when building the document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyHint {
    /// Dispatch on the response content type.
    Auto,
    /// Parse row-wise as CSV regardless of content type.
    Csv,
    /// Treat as flat text regardless of content type.
    PlainText,
}

/// Decodes fetched bytes into a [`RawDocument`], reducing PDFs to extracted
/// text and CSV to row lines. A blank body is the loader-level
/// empty-content failure; markup that merely cleans down to nothing is the
/// normalizer's concern.
pub(crate) fn document_from_output(
    source_url: &str,
    output: FetchOutput,
    hint: BodyHint,
) -> Result<RawDocument, FetchFailure> {
    if output.bytes.is_empty() {
        return Err(FetchFailure::new(
            FailureKind::EmptyContent,
            "zero-byte response body",
        ));
    }
    let content_type = output
        .metadata
        .content_type
        .as_deref()
        .map(main_content_type);

    if hint == BodyHint::Auto && content_type.as_deref() == Some("application/pdf") {
        let text = pdf_extract::extract_text_from_mem(&output.bytes)
            .map_err(|err| FetchFailure::new(FailureKind::Decode, err.to_string()))?;
        return plain_text_document(source_url, text);
    }

    let decoded = decode_text(&output.bytes, output.metadata.content_type.as_deref())
        .map_err(|err| FetchFailure::new(FailureKind::Decode, err.to_string()))?;

    if decoded.text.trim().is_empty() {
        return Err(FetchFailure::new(
            FailureKind::EmptyContent,
            "response body decoded to nothing",
        ));
    }

    let body = match hint {
        BodyHint::PlainText => DocumentBody::PlainText(decoded.text),
        BodyHint::Csv => csv_body(&decoded.text)?,
        BodyHint::Auto => match content_type.as_deref() {
            Some("text/csv") => csv_body(&decoded.text)?,
            Some(ct) if ct.contains("html") || ct.contains("xml") => {
                DocumentBody::Html(decoded.text)
            }
            Some(_) => DocumentBody::PlainText(decoded.text),
            // No content type: sniff for markup.
            None if decoded.text.trim_start().starts_with('<') => {
                DocumentBody::Html(decoded.text)
            }
            None => DocumentBody::PlainText(decoded.text),
        },
    };
    Ok(RawDocument {
        source_url: source_url.to_string(),
        body,
    })
}

fn csv_body(text: &str) -> Result<DocumentBody, FetchFailure> {
    let lines = csv_to_lines(text)
        .map_err(|err| FetchFailure::new(FailureKind::Decode, err.to_string()))?;
    Ok(DocumentBody::PlainText(lines))
}

fn plain_text_document(source_url: &str, text: String) -> Result<RawDocument, FetchFailure> {
    if text.trim().is_empty() {
        return Err(FetchFailure::new(
            FailureKind::EmptyContent,
            "no text extracted",
        ));
    }
    Ok(RawDocument {
        source_url: source_url.to_string(),
        body: DocumentBody::PlainText(text),
    })
}

fn main_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

fn has_csv_extension(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .is_some_and(|url| url.path().to_ascii_lowercase().ends_with(".csv"))
}

/// Rewrites code-hosting blob-viewer URLs to their raw-content equivalents
/// so file sources arrive as text instead of a viewer page.
pub(crate) fn rewrite_blob_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let path = parsed.path();
    match host.as_str() {
        "github.com" | "www.github.com" => {
            let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
            if segments.len() >= 5 && segments[2] == "blob" {
                return Some(format!(
                    "https://raw.githubusercontent.com/{}/{}/{}",
                    segments[0],
                    segments[1],
                    segments[3..].join("/")
                ));
            }
            None
        }
        "gitlab.com" => {
            if path.contains("/-/blob/") {
                Some(url.replacen("/-/blob/", "/-/raw/", 1))
            } else {
                None
            }
        }
        "bitbucket.org" => {
            let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
            if segments.len() >= 4 && segments[2] == "src" {
                return Some(format!(
                    "https://bitbucket.org/{}/{}/raw/{}",
                    segments[0],
                    segments[1],
                    segments[3..].join("/")
                ));
            }
            None
        }
        _ => None,
    }
}
