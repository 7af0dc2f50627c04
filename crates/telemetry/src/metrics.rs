//! In-process metrics.
//!
//! Counters live in a global registry and are exposed as a JSON snapshot on
//! the metrics endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns `(upper bound, count)` pairs.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the support desk.
#[derive(Debug, Default)]
pub struct Metrics {
    // Sessions
    pub sessions_created: Counter,
    pub sessions_closed: Counter,
    pub sessions_abandoned: Counter,
    pub auto_assignments: Counter,
    pub auto_assignment_misses: Counter,
    pub auto_assignment_errors: Counter,

    // Messages
    pub messages_appended: Counter,
    pub system_messages: Counter,

    // Transfers
    pub transfers_requested: Counter,
    pub transfers_accepted: Counter,
    pub transfers_rejected: Counter,
    pub transfers_cancelled: Counter,

    // Failures
    pub concurrency_conflicts: Counter,
    pub store_errors: Counter,
    pub rate_limited_requests: Counter,
    pub notifications_sent: Counter,
    pub notification_errors: Counter,

    // Latency histograms
    pub request_latency_ms: Histogram,
    pub store_latency_ms: Histogram,

    // Gauges
    pub waiting_backlog: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub sessions_created: u64,
    pub sessions_closed: u64,
    pub sessions_abandoned: u64,
    pub auto_assignments: u64,
    pub auto_assignment_misses: u64,
    pub auto_assignment_errors: u64,
    pub messages_appended: u64,
    pub system_messages: u64,
    pub transfers_requested: u64,
    pub transfers_accepted: u64,
    pub transfers_rejected: u64,
    pub transfers_cancelled: u64,
    pub concurrency_conflicts: u64,
    pub store_errors: u64,
    pub rate_limited_requests: u64,
    pub notifications_sent: u64,
    pub notification_errors: u64,
    pub request_latency_mean_ms: f64,
    pub store_latency_mean_ms: f64,
    pub waiting_backlog: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            sessions_created: self.sessions_created.get(),
            sessions_closed: self.sessions_closed.get(),
            sessions_abandoned: self.sessions_abandoned.get(),
            auto_assignments: self.auto_assignments.get(),
            auto_assignment_misses: self.auto_assignment_misses.get(),
            auto_assignment_errors: self.auto_assignment_errors.get(),
            messages_appended: self.messages_appended.get(),
            system_messages: self.system_messages.get(),
            transfers_requested: self.transfers_requested.get(),
            transfers_accepted: self.transfers_accepted.get(),
            transfers_rejected: self.transfers_rejected.get(),
            transfers_cancelled: self.transfers_cancelled.get(),
            concurrency_conflicts: self.concurrency_conflicts.get(),
            store_errors: self.store_errors.get(),
            rate_limited_requests: self.rate_limited_requests.get(),
            notifications_sent: self.notifications_sent.get(),
            notification_errors: self.notification_errors.get(),
            request_latency_mean_ms: self.request_latency_ms.mean(),
            store_latency_mean_ms: self.store_latency_ms.mean(),
            waiting_backlog: self.waiting_backlog.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
