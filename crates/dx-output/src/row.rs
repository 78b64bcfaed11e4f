//! Plain data row types written by output backends.

use std::fmt;

/// One drawn marker position.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSampleRow {
    /// Frame instant (Unix ms).
    pub at_ms:    i64,
    pub resource: String,
    pub lat:      f64,
    pub lng:      f64,
}

/// What happened to a marker outside the per-frame sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerEventKind {
    Arrived,
    Settled,
    Removed,
}

impl MarkerEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerEventKind::Arrived => "arrived",
            MarkerEventKind::Settled => "settled",
            MarkerEventKind::Removed => "removed",
        }
    }
}

impl fmt::Display for MarkerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An arrival, a settle or a removal.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEventRow {
    /// Instant of the frame during or after which the event was seen.
    pub at_ms:    i64,
    pub resource: String,
    pub kind:     MarkerEventKind,
    /// Movement epoch; only for arrivals.
    pub epoch_ms: Option<i64>,
    /// Marker position; absent for removals.
    pub position: Option<(f64, f64)>,
}

/// Summary of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummaryRow {
    pub frame:  u64,
    pub at_ms:  i64,
    pub moving: u64,
}
