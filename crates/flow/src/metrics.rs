//! Fan-out metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single fan-out point (source or merged output)
#[derive(Debug, Default)]
pub struct FanOutMetrics {
    /// Currently registered downstreams
    taps: AtomicUsize,
    /// Items delivered to at least one downstream
    forwarded: AtomicU64,
    /// Items that arrived while no downstream was registered
    dropped: AtomicU64,
    /// Downstreams removed after their readable was dropped
    closed_taps: AtomicU64,
}

impl FanOutMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current downstream count
    pub fn taps(&self) -> usize {
        self.taps.load(Ordering::Relaxed)
    }

    /// Set current downstream count
    pub fn set_taps(&self, taps: usize) {
        self.taps.store(taps, Ordering::Relaxed);
    }

    /// Get forwarded count
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Increment forwarded count
    pub fn inc_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get dropped count
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Increment dropped count
    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get closed downstream count
    pub fn closed_taps(&self) -> u64 {
        self.closed_taps.load(Ordering::Relaxed)
    }

    /// Add to closed downstream count
    pub fn add_closed_taps(&self, n: u64) {
        self.closed_taps.fetch_add(n, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> FanOutSnapshot {
        FanOutSnapshot {
            taps: self.taps(),
            forwarded: self.forwarded(),
            dropped: self.dropped(),
            closed_taps: self.closed_taps(),
        }
    }
}

/// Snapshot of fan-out metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutSnapshot {
    pub taps: usize,
    pub forwarded: u64,
    pub dropped: u64,
    pub closed_taps: u64,
}
