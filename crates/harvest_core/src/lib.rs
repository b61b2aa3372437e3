//! Harvest core: pure classification, cleaning, chunking, and run bookkeeping.
//!
//! Nothing in this crate performs IO. File contents go in, decisions and
//! warnings come out, so runs can be tested in isolation and in parallel.
mod chunk;
mod clean;
mod input;
mod routing;
mod run;
mod stats;
mod tracker;

pub use chunk::{split_text, Chunk, ChunkSettings};
pub use clean::{clean_text, collapse_whitespace, CleanSettings};
pub use input::parse_url_list;
pub use routing::{ParseWarning, RoutingDecision, RoutingTable};
pub use run::{RunLedger, RunPhase};
pub use stats::{FailedUrl, HarvestStats, Pass};
pub use tracker::{ExtractedLink, LinkTracker};
