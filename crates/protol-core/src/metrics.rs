//! Global atomic counters for the reputation engine.
//!
//! Counters are incremented at the call site. [`Metrics::flush`] emits the
//! current values as one `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    actions_recorded: AtomicU64,
    incidents_reported: AtomicU64,
    recomputes: AtomicU64,
    record_fallbacks: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            actions_recorded: AtomicU64::new(0),
            incidents_reported: AtomicU64::new(0),
            recomputes: AtomicU64::new(0),
            record_fallbacks: AtomicU64::new(0),
        }
    }

    pub fn inc_actions_recorded(&self) {
        self.actions_recorded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "actions_recorded", "counter incremented");
    }

    pub fn inc_incidents_reported(&self) {
        self.incidents_reported.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "incidents_reported", "counter incremented");
    }

    pub fn inc_recomputes(&self) {
        self.recomputes.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "recomputes", "counter incremented");
    }

    /// Counts records that fell back to the stub response.
    pub fn inc_record_fallbacks(&self) {
        self.record_fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "record_fallbacks", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            actions_recorded = self.actions_recorded(),
            incidents_reported = self.incidents_reported(),
            recomputes = self.recomputes(),
            record_fallbacks = self.record_fallbacks(),
        );
    }

    pub fn actions_recorded(&self) -> u64 {
        self.actions_recorded.load(Ordering::Relaxed)
    }

    pub fn incidents_reported(&self) -> u64 {
        self.incidents_reported.load(Ordering::Relaxed)
    }

    pub fn recomputes(&self) -> u64 {
        self.recomputes.load(Ordering::Relaxed)
    }

    pub fn record_fallbacks(&self) -> u64 {
        self.record_fallbacks.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (tests only).
    pub fn reset(&self) {
        self.actions_recorded.store(0, Ordering::Relaxed);
        self.incidents_reported.store(0, Ordering::Relaxed);
        self.recomputes.store(0, Ordering::Relaxed);
        self.record_fallbacks.store(0, Ordering::Relaxed);
    }
}
