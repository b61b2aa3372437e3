//! The harvest orchestrator.
//!
//! Drives a URL batch through routing, loading, normalization, and the
//! sink: pass 1 over every input, then an optional render-forced pass 2
//! over exactly the pass-1 failures, then a finalization that flushes the
//! sink and appends the links file and failure log. Finalization also runs
//! when the run is cancelled mid-flight, so partial progress is never lost.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use harvest_core::{
    FailedUrl, HarvestStats, LinkTracker, RoutingDecision, RoutingTable, RunLedger,
};
use harvest_logging::{harvest_error, harvest_info, harvest_warn};

use crate::loader::{LoaderSelect, LoaderSettings};
use crate::normalize::{NormalizeSettings, Normalizer};
use crate::persist;
use crate::sink::{Accepted, ChunkSink, SinkError};
use crate::types::FetchResult;

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub loader: LoaderSettings,
    pub normalize: NormalizeSettings,
    /// Re-fetch pass-1 failures through the render loader.
    pub retry_failed: bool,
    /// Append `source -> target` lines here during finalization.
    pub links_file: Option<PathBuf>,
    /// Append failure audit records here during finalization.
    pub failed_urls_file: Option<PathBuf>,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            loader: LoaderSettings::default(),
            normalize: NormalizeSettings::default(),
            retry_failed: true,
            links_file: None,
            failed_urls_file: None,
        }
    }
}

/// The one fatal condition after INIT: the sink is gone for good. Per-URL
/// trouble never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum HarvestFatal {
    #[error("chunk sink unavailable: {0}")]
    Sink(#[from] SinkError),
}

/// What a finished (or cancelled) run produced.
#[derive(Debug)]
pub struct HarvestOutcome {
    pub stats: HarvestStats,
    pub failures: Vec<FailedUrl>,
    pub cancelled: bool,
}

/// Orchestrates one batch. The routing table is injected so concurrent
/// runs never share mutable state; a fresh `Harvester` is a fresh run.
pub struct Harvester {
    routing: RoutingTable,
    loader: LoaderSelect,
    normalizer: Normalizer,
    settings: HarvestSettings,
    cancel: CancellationToken,
}

impl Harvester {
    pub fn new(routing: RoutingTable, settings: HarvestSettings) -> Self {
        Self {
            routing,
            loader: LoaderSelect::new(settings.loader.clone()),
            normalizer: Normalizer::new(settings.normalize.clone()),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Token observed between URLs. Cancelling stops the run before the
    /// next URL; everything already produced still reaches disk.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs both passes and finalizes. The caller opens the sink (its
    /// failure is the fatal INIT condition); here only total sink
    /// unavailability at flush time is fatal.
    pub async fn run(
        &mut self,
        urls: &[String],
        sink: &mut dyn ChunkSink,
    ) -> Result<HarvestOutcome, HarvestFatal> {
        let mut ledger = RunLedger::new();
        let mut tracker = LinkTracker::new();

        // Decisions are computed once per URL and reused by the retry pass.
        let mut decisions: HashMap<&str, RoutingDecision> = HashMap::new();
        for url in urls {
            decisions
                .entry(url.as_str())
                .or_insert_with(|| self.routing.classify(url));
        }

        ledger.begin();
        harvest_info!("pass 1: {} urls", urls.len());
        let mut cancelled = false;
        for url in urls {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            ledger.record_attempt();
            let decision = decisions[url.as_str()];
            let result = self.loader.fetch(url, decision, false).await;
            self.apply_result(&result, &mut ledger, &mut tracker, sink);
        }

        if self.settings.retry_failed && !cancelled && ledger.has_retryable_failures() {
            let retry_urls = ledger.start_retry();
            harvest_info!(
                "pass 2: retrying {} failed urls through the render loader",
                retry_urls.len()
            );
            for url in &retry_urls {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                let decision = decisions
                    .get(url.as_str())
                    .copied()
                    .unwrap_or(RoutingDecision::Default);
                let result = self.loader.fetch(url, decision, true).await;
                self.apply_result(&result, &mut ledger, &mut tracker, sink);
            }
        }

        if cancelled {
            harvest_warn!("run cancelled; finalizing with partial progress");
        }

        // FINALIZED: flush everything, cancelled or not.
        let stats = ledger.finalize();
        let sink_flush = sink.flush();
        if let Some(path) = &self.settings.links_file {
            if let Err(err) = persist::append_links(path, &tracker) {
                harvest_error!("could not append links file {}: {err}", path.display());
            }
        }
        if let Some(path) = &self.settings.failed_urls_file {
            if let Err(err) = persist::append_failed_urls(path, ledger.failures()) {
                harvest_error!("could not append failure log {}: {err}", path.display());
            }
        }
        sink_flush?;

        harvest_info!(
            "harvest finished: {} attempted, {} succeeded, {} failed, {} chunks written, {} links found",
            stats.attempted,
            stats.succeeded,
            stats.failed,
            stats.chunks_written,
            stats.links_found
        );
        Ok(HarvestOutcome {
            stats,
            failures: ledger.failures().to_vec(),
            cancelled,
        })
    }

    fn apply_result(
        &self,
        result: &FetchResult,
        ledger: &mut RunLedger,
        tracker: &mut LinkTracker,
        sink: &mut dyn ChunkSink,
    ) {
        match result.failure() {
            Some(failure) => {
                harvest_warn!(
                    "{} failed via {:?} loader: {}",
                    result.url,
                    result.loader,
                    failure.kind
                );
                ledger.record_failure(&result.url, failure.kind.to_string());
            }
            None => {
                let (chunks, links) = self.normalizer.process(result);
                let mut written = 0;
                for chunk in &chunks {
                    match write_with_retry(sink, chunk) {
                        Ok(_) => written += 1,
                        Err(err) => harvest_error!(
                            "dropping chunk {} of {}: {err}",
                            chunk.index,
                            chunk.source_url
                        ),
                    }
                }
                let mut new_links = 0;
                for link in &links {
                    if tracker.add(&link.source_url, &link.target_url) {
                        new_links += 1;
                    }
                }
                ledger.record_success(written, new_links);
            }
        }
    }
}

/// One retry per chunk on a write failure; after that the chunk is the
/// caller's loss to record. A duplicate rejection counts as written.
fn write_with_retry(sink: &mut dyn ChunkSink, chunk: &harvest_core::Chunk) -> Result<Accepted, SinkError> {
    match sink.accept(chunk) {
        Ok(accepted) => Ok(accepted),
        Err(first) => {
            harvest_warn!("sink write failed, retrying once: {first}");
            sink.accept(chunk)
        }
    }
}
