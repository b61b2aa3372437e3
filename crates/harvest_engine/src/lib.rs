//! Harvest engine: loaders, normalization, sinks, and the run orchestrator.
mod crawl;
mod decode;
mod fetch;
mod harvest;
mod loader;
mod normalize;
mod persist;
mod render;
mod rows;
mod sink;
mod types;

pub use crawl::crawl;
pub use decode::{decode_text, DecodeError, DecodedText};
pub use fetch::{FetchSettings, PageFetcher, StaticFetcher};
pub use harvest::{Harvester, HarvestFatal, HarvestOutcome, HarvestSettings};
pub use loader::{LoaderSelect, LoaderSettings, RateLimiter};
pub use normalize::{NormalizeError, NormalizeSettings, Normalizer};
pub use persist::{append_failed_urls, append_links, ensure_output_dir, PersistError};
pub use render::{RenderClient, RenderSettings};
pub use rows::csv_to_lines;
pub use sink::{Accepted, CallbackSink, ChunkSink, JsonlFileSink, SinkError};
pub use types::{
    DocumentBody, FailureKind, FetchFailure, FetchMetadata, FetchOutcome, FetchOutput,
    FetchResult, LoaderKind, RawDocument,
};
