//! Run statistics and the failure audit trail.

use std::fmt;

/// Aggregate counters for one harvest run. Mutated only through the run
/// ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestStats {
    /// Input URLs processed in pass 1.
    pub attempted: usize,
    /// URLs whose fetch and normalization completed, including those that
    /// cleaned down to zero chunks.
    pub succeeded: usize,
    /// URLs still failed after all passes.
    pub failed: usize,
    /// Chunks acknowledged by the sink (duplicates included).
    pub chunks_written: usize,
    /// Unique links registered with the tracker.
    pub links_found: usize,
}

/// Which iteration over the URL set recorded an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// The full input list.
    First,
    /// Pass-1 failures only, render-forced.
    Second,
}

impl Pass {
    /// The pass as the number used in audit output.
    pub fn number(self) -> u8 {
        match self {
            Pass::First => 1,
            Pass::Second => 2,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Audit record for a URL that produced no documents. Records are appended,
/// never removed: a URL that fails both passes has two entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUrl {
    /// The input URL.
    pub url: String,
    /// Which pass recorded the failure.
    pub pass: Pass,
    /// Human-readable failure reason.
    pub reason: String,
}
