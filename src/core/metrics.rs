//! Counters for logger and target health
//!
//! [`LoggerMetrics`] covers the producer side: accumulation, flushes and the
//! background queue. [`TargetMetrics`] covers one target's filter and export
//! activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the logger and its dispatch route
///
/// # Example
///
/// ```
/// use log_dispatcher::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_logged();
/// metrics.record_flush();
///
/// assert_eq!(metrics.total_logged(), 1);
/// assert_eq!(metrics.flushes(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Messages accepted into the logger buffer
    total_logged: AtomicU64,

    /// Batches handed to the dispatcher
    flushes: AtomicU64,

    /// Messages logged after the final flush
    discarded_after_shutdown: AtomicU64,

    /// Messages lost because the background queue was full
    dropped_count: AtomicU64,

    /// Number of times the background queue was full
    queue_full_events: AtomicU64,

    /// Number of times a flush blocked waiting for queue space
    block_events: AtomicU64,

    /// Batches with error-level messages dispatched inline on overflow
    critical_batches_preserved: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            discarded_after_shutdown: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            critical_batches_preserved: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discarded_after_shutdown(&self) -> u64 {
        self.discarded_after_shutdown.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn critical_batches_preserved(&self) -> u64 {
        self.critical_batches_preserved.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flush(&self) -> u64 {
        self.flushes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_discarded(&self) -> u64 {
        self.discarded_after_shutdown.fetch_add(1, Ordering::Relaxed)
    }

    /// Record `count` dropped messages, returning the previous total
    #[inline]
    pub fn record_dropped(&self, count: u64) -> u64 {
        self.dropped_count.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_critical_preserved(&self) -> u64 {
        self.critical_batches_preserved.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been logged.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.total_logged() as f64;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.flushes.store(0, Ordering::Relaxed);
        self.discarded_after_shutdown.store(0, Ordering::Relaxed);
        self.dropped_count.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
        self.critical_batches_preserved.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            flushes: AtomicU64::new(self.flushes()),
            discarded_after_shutdown: AtomicU64::new(self.discarded_after_shutdown()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
            critical_batches_preserved: AtomicU64::new(self.critical_batches_preserved()),
        }
    }
}

/// Per-target counters
#[derive(Debug, Default)]
pub struct TargetMetrics {
    collected: AtomicU64,
    exported: AtomicU64,
    export_calls: AtomicU64,
    export_failures: AtomicU64,
    dropped: AtomicU64,
    panics: AtomicU64,
}

impl TargetMetrics {
    pub const fn new() -> Self {
        Self {
            collected: AtomicU64::new(0),
            exported: AtomicU64::new(0),
            export_calls: AtomicU64::new(0),
            export_failures: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            panics: AtomicU64::new(0),
        }
    }

    /// Messages that passed the filter
    #[inline]
    pub fn collected(&self) -> u64 {
        self.collected.load(Ordering::Relaxed)
    }

    /// Messages delivered by successful exports
    #[inline]
    pub fn exported(&self) -> u64 {
        self.exported.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn export_calls(&self) -> u64 {
        self.export_calls.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn export_failures(&self) -> u64 {
        self.export_failures.load(Ordering::Relaxed)
    }

    /// Messages discarded by the failure policy
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn panics(&self) -> u64 {
        self.panics.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_collected(&self, count: usize) {
        self.collected.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_export(&self, count: usize) {
        self.export_calls.fetch_add(1, Ordering::Relaxed);
        self.exported.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_failure(&self) {
        self.export_calls.fetch_add(1, Ordering::Relaxed);
        self.export_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self, count: usize) {
        self.dropped.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }
}
