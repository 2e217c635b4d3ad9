//! Per-resource request metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Request counter and latency accumulator for one resource.
///
/// All counters use atomic operations with `Relaxed` ordering: metrics are
/// eventually consistent and extremely low-cost to collect.
#[derive(Debug, Default)]
pub struct ResourceMetrics {
    requests: AtomicU64,
    total_latency_ns: AtomicU64,
}

impl ResourceMetrics {
    /// Create zeroed metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one handled request and its latency.
    pub fn record(&self, latency: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Total requests handled by this resource.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Mean request latency, zero before the first request.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.requests.load(Ordering::Relaxed);
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_latency() {
        let metrics = ResourceMetrics::new();
        assert_eq!(metrics.average_latency(), Duration::from_nanos(0));
        metrics.record(Duration::from_millis(100));
        metrics.record(Duration::from_millis(300));
        assert_eq!(metrics.request_count(), 2);
        assert_eq!(metrics.average_latency(), Duration::from_millis(200));
    }
}
