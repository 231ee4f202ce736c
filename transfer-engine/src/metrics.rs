//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the engine.
//!
//! # Metrics
//!
//! - `bank_deposits_total` - Total number of committed deposits
//! - `bank_withdrawals_total` - Total number of committed withdrawals
//! - `bank_transfers_total` - Total number of committed transfers
//! - `bank_rejections_total` - Total number of rejected requests
//! - `bank_commit_duration_seconds` - Histogram of request latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
///
/// Each collector owns its registry, so independent engines in one
/// process never collide on metric names.
#[derive(Clone)]
pub struct EngineMetrics {
    /// Total deposits committed
    pub deposits_total: IntCounter,

    /// Total withdrawals committed
    pub withdrawals_total: IntCounter,

    /// Total transfers committed
    pub transfers_total: IntCounter,

    /// Total requests rejected
    pub rejections_total: IntCounter,

    /// Request latency histogram
    pub commit_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl EngineMetrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let deposits_total =
            IntCounter::new("bank_deposits_total", "Total number of committed deposits")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let withdrawals_total = IntCounter::new(
            "bank_withdrawals_total",
            "Total number of committed withdrawals",
        )?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let transfers_total =
            IntCounter::new("bank_transfers_total", "Total number of committed transfers")?;
        registry.register(Box::new(transfers_total.clone()))?;

        let rejections_total =
            IntCounter::new("bank_rejections_total", "Total number of rejected requests")?;
        registry.register(Box::new(rejections_total.clone()))?;

        let commit_duration = Histogram::with_opts(
            HistogramOpts::new(
                "bank_commit_duration_seconds",
                "Histogram of request latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(commit_duration.clone()))?;

        Ok(Self {
            deposits_total,
            withdrawals_total,
            transfers_total,
            rejections_total,
            commit_duration,
            registry,
        })
    }

    /// Record a rejected request
    pub fn record_rejection(&self) {
        self.rejections_total.inc();
    }

    /// Record request latency
    pub fn record_commit_duration(&self, duration_seconds: f64) {
        self.commit_duration.observe(duration_seconds);
    }

    /// Total committed requests across all kinds
    pub fn committed_total(&self) -> u64 {
        self.deposits_total.get() + self.withdrawals_total.get() + self.transfers_total.get()
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = EngineMetrics::new().unwrap();
        assert_eq!(metrics.deposits_total.get(), 0);
        assert_eq!(metrics.committed_total(), 0);
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.deposits_total.inc();
        metrics.transfers_total.inc();
        metrics.transfers_total.inc();
        metrics.record_rejection();
        assert_eq!(metrics.committed_total(), 3);
        assert_eq!(metrics.rejections_total.get(), 1);
    }

    #[test]
    fn test_independent_collectors_do_not_clash() {
        let first = EngineMetrics::new().unwrap();
        let second = EngineMetrics::new().unwrap();
        first.deposits_total.inc();
        assert_eq!(first.deposits_total.get(), 1);
        assert_eq!(second.deposits_total.get(), 0);
    }

    #[test]
    fn test_record_commit_duration() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.record_commit_duration(0.002);
        metrics.record_commit_duration(0.150);
        // Histogram recorded successfully (no assertion on histogram internals)
    }
}
