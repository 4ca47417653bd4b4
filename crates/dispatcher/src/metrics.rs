//! Delivery metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single delivery channel
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    /// Deliveries accepted downstream
    delivered_count: AtomicU64,
    /// Deliveries answered with a rejection
    rejected_count: AtomicU64,
    /// Deliveries that raised an error
    failed_count: AtomicU64,
    /// Envelopes handed to the channel
    envelope_count: AtomicU64,
}

impl DeliveryMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    pub fn inc_delivered_count(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    pub fn inc_rejected_count(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    pub fn inc_failed_count(&self) {
        self.failed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn envelope_count(&self) -> u64 {
        self.envelope_count.load(Ordering::Relaxed)
    }

    pub fn add_envelopes(&self, count: usize) {
        self.envelope_count.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Total calls routed to this channel
    pub fn attempt_count(&self) -> u64 {
        self.delivered_count() + self.rejected_count() + self.failed_count()
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            delivered_count: self.delivered_count(),
            rejected_count: self.rejected_count(),
            failed_count: self.failed_count(),
            envelope_count: self.envelope_count(),
        }
    }
}

/// Snapshot of channel metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub delivered_count: u64,
    pub rejected_count: u64,
    pub failed_count: u64,
    pub envelope_count: u64,
}

impl MetricsSnapshot {
    pub fn attempts(&self) -> u64 {
        self.delivered_count + self.rejected_count + self.failed_count
    }
}
