use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing devotional request outcomes.
#[derive(Default)]
pub struct DevotionalMetrics {
    requests_received: AtomicU64,
    devotionals_generated: AtomicU64,
    rejected_requests: AtomicU64,
    generation_failures: AtomicU64,
}

impl DevotionalMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incoming generation request.
    pub fn record_request(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a devotional returned to the caller.
    pub fn record_success(&self) {
        self.devotionals_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request turned away before reaching the provider.
    pub fn record_rejection(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed downstream call.
    pub fn record_failure(&self) {
        self.generation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            devotionals_generated: self.devotionals_generated.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            generation_failures: self.generation_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of request counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Generation requests received since startup.
    pub requests_received: u64,
    /// Devotionals successfully returned.
    pub devotionals_generated: u64,
    /// Requests rejected by configuration or input validation.
    pub rejected_requests: u64,
    /// Downstream calls that failed.
    pub generation_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_outcome() {
        let metrics = DevotionalMetrics::new();
        for _ in 0..4 {
            metrics.record_request();
        }
        metrics.record_success();
        metrics.record_success();
        metrics.record_rejection();
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_received, 4);
        assert_eq!(snapshot.devotionals_generated, 2);
        assert_eq!(snapshot.rejected_requests, 1);
        assert_eq!(snapshot.generation_failures, 1);
    }

    #[test]
    fn snapshot_starts_at_zero() {
        let snapshot = DevotionalMetrics::new().snapshot();
        assert_eq!(snapshot.requests_received, 0);
        assert_eq!(snapshot.devotionals_generated, 0);
    }
}
