//! Observability counters for the throttle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters describing what the throttle did with incoming calls.
///
/// Cloning shares the underlying counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Calls passed straight through to the wrapped logger
    events_forwarded: AtomicU64,
    /// Calls absorbed into an existing bucket
    events_suppressed: AtomicU64,
    /// Buckets dropped by a flush because nothing was pending
    buckets_evicted: AtomicU64,
    /// Summary entries forwarded by flushes
    summaries_emitted: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_forwarded(&self) {
        self.inner.events_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suppressed(&self) {
        self.inner.events_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.inner
            .buckets_evicted
            .fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_summaries(&self, count: u64) {
        self.inner
            .summaries_emitted
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn events_forwarded(&self) -> u64 {
        self.inner.events_forwarded.load(Ordering::Relaxed)
    }

    pub fn events_suppressed(&self) -> u64 {
        self.inner.events_suppressed.load(Ordering::Relaxed)
    }

    pub fn buckets_evicted(&self) -> u64 {
        self.inner.buckets_evicted.load(Ordering::Relaxed)
    }

    pub fn summaries_emitted(&self) -> u64 {
        self.inner.summaries_emitted.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_forwarded: self.events_forwarded(),
            events_suppressed: self.events_suppressed(),
            buckets_evicted: self.buckets_evicted(),
            summaries_emitted: self.summaries_emitted(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.events_forwarded.store(0, Ordering::Relaxed);
        self.inner.events_suppressed.store(0, Ordering::Relaxed);
        self.inner.buckets_evicted.store(0, Ordering::Relaxed);
        self.inner.summaries_emitted.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_forwarded: u64,
    pub events_suppressed: u64,
    pub buckets_evicted: u64,
    pub summaries_emitted: u64,
}

impl MetricsSnapshot {
    /// Ratio of suppressed calls to all calls, 0.0 when nothing was logged.
    pub fn suppression_rate(&self) -> f64 {
        let total = self.total_events();
        if total == 0 {
            0.0
        } else {
            self.events_suppressed as f64 / total as f64
        }
    }

    /// Get the total number of calls seen (forwarded + suppressed).
    pub fn total_events(&self) -> u64 {
        self.events_forwarded.saturating_add(self.events_suppressed)
    }
}
