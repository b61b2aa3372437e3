//! Pure bookkeeping for the two-pass run state machine.

use crate::stats::{FailedUrl, HarvestStats, Pass};

/// Phases of a harvest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Constructed, nothing processed yet.
    Init,
    /// Iterating the full input list.
    PassOne,
    /// Re-fetching pass-1 failures through the render loader.
    PassTwo,
    /// All passes done, stats frozen.
    Finalized,
}

/// Tracks phase transitions, statistics, and the failure audit trail for a
/// single run. The retry pass receives its input URLs from here, never by
/// re-reading logs. All mutation of [`HarvestStats`] funnels through this
/// type.
#[derive(Debug)]
pub struct RunLedger {
    phase: RunPhase,
    stats: HarvestStats,
    failures: Vec<FailedUrl>,
}

impl RunLedger {
    /// A fresh ledger in `Init`.
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Init,
            stats: HarvestStats::default(),
            failures: Vec::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Counters so far.
    pub fn stats(&self) -> &HarvestStats {
        &self.stats
    }

    /// Every failure recorded so far, both passes, in order.
    pub fn failures(&self) -> &[FailedUrl] {
        &self.failures
    }

    /// `Init` -> `PassOne`.
    pub fn begin(&mut self) {
        debug_assert_eq!(self.phase, RunPhase::Init);
        self.phase = RunPhase::PassOne;
    }

    /// Pass 1 picked up the next input URL.
    pub fn record_attempt(&mut self) {
        debug_assert_eq!(self.phase, RunPhase::PassOne);
        self.stats.attempted += 1;
    }

    /// A fetch-and-normalize round completed. `chunks` counts sink-accepted
    /// chunks, `links` newly tracked pairs. In pass 2 the URL also leaves
    /// the effective failed count.
    pub fn record_success(&mut self, chunks: usize, links: usize) {
        match self.phase {
            RunPhase::PassOne => self.stats.succeeded += 1,
            RunPhase::PassTwo => {
                self.stats.succeeded += 1;
                self.stats.failed = self.stats.failed.saturating_sub(1);
            }
            RunPhase::Init | RunPhase::Finalized => {
                debug_assert!(false, "success recorded outside a pass")
            }
        }
        self.stats.chunks_written += chunks;
        self.stats.links_found += links;
    }

    /// A URL produced no documents. Pass-2 failures append a second audit
    /// record without touching the failed count, which pass 1 already
    /// incremented for that URL.
    pub fn record_failure(&mut self, url: impl Into<String>, reason: impl Into<String>) {
        let pass = match self.phase {
            RunPhase::PassOne => {
                self.stats.failed += 1;
                Pass::First
            }
            RunPhase::PassTwo => Pass::Second,
            RunPhase::Init | RunPhase::Finalized => {
                debug_assert!(false, "failure recorded outside a pass");
                Pass::First
            }
        };
        self.failures.push(FailedUrl {
            url: url.into(),
            pass,
            reason: reason.into(),
        });
    }

    /// True when pass 1 left failures behind for a retry pass to pick up.
    pub fn has_retryable_failures(&self) -> bool {
        self.failures.iter().any(|f| f.pass == Pass::First)
    }

    /// `PassOne` -> `PassTwo`. Yields exactly the pass-1 failure URLs, in
    /// the order they failed: this list is the complete retry-pass payload.
    pub fn start_retry(&mut self) -> Vec<String> {
        debug_assert_eq!(self.phase, RunPhase::PassOne);
        self.phase = RunPhase::PassTwo;
        self.failures
            .iter()
            .filter(|f| f.pass == Pass::First)
            .map(|f| f.url.clone())
            .collect()
    }

    /// Any pass -> `Finalized`; returns the frozen stats.
    pub fn finalize(&mut self) -> HarvestStats {
        self.phase = RunPhase::Finalized;
        self.stats.clone()
    }
}

impl Default for RunLedger {
    fn default() -> Self {
        Self::new()
    }
}
