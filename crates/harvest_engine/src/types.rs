use std::fmt;

/// Which loader strategy handled a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    /// Skip-listed, never fetched.
    Skip,
    /// Blob-viewer URL rewritten to its raw-content equivalent.
    RawBlob,
    /// Breadth-first same-domain crawl.
    RecursiveCrawl,
    /// Row-wise CSV parse.
    CsvRows,
    /// Remote rendering service.
    Render,
    /// Plain static fetch.
    Static,
}

/// Metadata captured alongside fetched bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

/// Raw bytes straight off the wire, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

/// A fetch-level failure. Always carried as a value; the loader never
/// raises, so one bad URL can never abort a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Failure taxonomy surfaced by the loader strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Skipped,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    RenderService,
    Decode,
    EmptyContent,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Skipped => write!(f, "skipped"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::RenderService => write!(f, "render service failure"),
            FailureKind::Decode => write!(f, "content decode failure"),
            FailureKind::EmptyContent => write!(f, "empty content"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Decoded page content ready for normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBody {
    /// Markup: the normalizer strips boilerplate and extracts links.
    Html(String),
    /// Already-flat text: CSV rows, raw files, extracted PDF text,
    /// render-service output.
    PlainText(String),
}

/// One retrieved page or file. A recursive crawl yields one per discovered
/// page; every other strategy yields exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub source_url: String,
    pub body: DocumentBody,
}

/// Uniform outcome of the loader selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    pub loader: LoaderKind,
    pub outcome: FetchOutcome,
}

/// Success-or-failure as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(Vec<RawDocument>),
    Failed(FetchFailure),
}

impl FetchResult {
    pub(crate) fn fetched(url: &str, loader: LoaderKind, documents: Vec<RawDocument>) -> Self {
        Self {
            url: url.to_string(),
            loader,
            outcome: FetchOutcome::Fetched(documents),
        }
    }

    pub(crate) fn failed(url: &str, loader: LoaderKind, failure: FetchFailure) -> Self {
        Self {
            url: url.to_string(),
            loader,
            outcome: FetchOutcome::Failed(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Fetched(_))
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match &self.outcome {
            FetchOutcome::Failed(failure) => Some(failure),
            FetchOutcome::Fetched(_) => None,
        }
    }
}
