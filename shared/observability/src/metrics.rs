//! Process-wide request metrics.
//!
//! Counters and timings are shared across concurrent requests; updates go
//! through a single lock so snapshots are internally consistent.

use parking_lot::RwLock;
use serde::Serialize;

/// Outcome of one handled request.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub endpoint: &'static str,
    pub duration_ms: f64,
    pub succeeded: bool,
    pub cache_hit: bool,
}

/// Aggregated request counters since process start.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub cache_hits: u64,
    pub avg_processing_time_ms: f64,
    pub max_processing_time_ms: f64,
}

#[derive(Debug, Default)]
struct MetricsState {
    total: u64,
    successful: u64,
    failed: u64,
    cache_hits: u64,
    total_time_ms: f64,
    max_time_ms: f64,
}

/// Collects request metrics for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    state: RwLock<MetricsState>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: RequestRecord) {
        let mut state = self.state.write();
        state.total += 1;
        if record.succeeded {
            state.successful += 1;
        } else {
            state.failed += 1;
        }
        if record.cache_hit {
            state.cache_hits += 1;
        }
        state.total_time_ms += record.duration_ms;
        if record.duration_ms > state.max_time_ms {
            state.max_time_ms = record.duration_ms;
        }
        tracing::debug!(
            endpoint = record.endpoint,
            duration_ms = record.duration_ms,
            succeeded = record.succeeded,
            cache_hit = record.cache_hit,
            "request recorded"
        );
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.read();
        let avg = if state.total == 0 {
            0.0
        } else {
            state.total_time_ms / state.total as f64
        };
        MetricsSnapshot {
            total_requests: state.total,
            successful_requests: state.successful,
            failed_requests: state.failed,
            cache_hits: state.cache_hits,
            avg_processing_time_ms: avg,
            max_processing_time_ms: state.max_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(duration_ms: f64, succeeded: bool, cache_hit: bool) -> RequestRecord {
        RequestRecord {
            endpoint: "/query",
            duration_ms,
            succeeded,
            cache_hit,
        }
    }

    #[test]
    fn test_snapshot_aggregation() {
        let collector = MetricsCollector::new();
        collector.record(record(10.0, true, false));
        collector.record(record(30.0, true, true));
        collector.record(record(20.0, false, false));

        let snap = collector.snapshot();
        assert_eq!(snap.total_requests, 3);
        assert_eq!(snap.successful_requests, 2);
        assert_eq!(snap.failed_requests, 1);
        assert_eq!(snap.cache_hits, 1);
        assert!((snap.avg_processing_time_ms - 20.0).abs() < 1e-9);
        assert!((snap.max_processing_time_ms - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot_has_zero_average() {
        let snap = MetricsCollector::new().snapshot();
        assert_eq!(snap.total_requests, 0);
        assert_eq!(snap.avg_processing_time_ms, 0.0);
    }
}
