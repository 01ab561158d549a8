use crate::types::{DataRetrievalError, SourceHealth};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Per-source request outcomes, fed by real quote lookups
pub(crate) struct HealthTracker {
    /// Millis since epoch, 0 when never
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    total_latency_ms: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl HealthTracker {
    pub(crate) fn new() -> Self {
        Self {
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    /// Record the outcome of one quote lookup
    pub(crate) fn observe<T>(&self, outcome: &Result<T, DataRetrievalError>, elapsed: Duration) {
        match outcome {
            Ok(_) => self.record_success(elapsed),
            Err(e) => self.record_failure(e),
        }
    }

    pub(crate) fn record_success(&self, elapsed: Duration) {
        self.last_success_ms.store(now_ms(), Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, error: &DataRetrievalError) {
        self.last_failure_ms.store(now_ms(), Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_error.lock() {
            *last = Some(error.to_string());
        }
    }

    pub(crate) fn snapshot(&self, source: &str) -> SourceHealth {
        let last_success = self.last_success_ms.load(Ordering::Relaxed);
        let last_failure = self.last_failure_ms.load(Ordering::Relaxed);
        let successes = self.successes.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);

        // Healthy once the latest outcome is a success
        let is_healthy = last_success > 0 && last_success >= last_failure;

        let success_rate = match successes + failures {
            0 => 1.0,
            total => successes as f64 / total as f64,
        };
        let avg_latency_ms = match successes {
            0 => 0,
            n => self.total_latency_ms.load(Ordering::Relaxed) / n,
        };
        let last_error = if is_healthy {
            None
        } else {
            self.last_error.lock().ok().and_then(|e| e.clone())
        };

        SourceHealth {
            source: source.to_string(),
            is_healthy,
            last_success: (last_success > 0)
                .then(|| DateTime::from_timestamp_millis(last_success as i64))
                .flatten(),
            last_error,
            success_rate,
            avg_latency_ms,
        }
    }
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_tracker_is_unhealthy_but_optimistic() {
        let tracker = HealthTracker::new();
        let health = tracker.snapshot("binance");
        assert!(!health.is_healthy);
        assert_eq!(health.success_rate, 1.0);
        assert!(health.last_success.is_none());
        assert!(health.last_error.is_none());
    }

    #[test]
    fn test_success_then_failure() {
        let tracker = HealthTracker::new();
        tracker.record_success(Duration::from_millis(40));
        tracker.record_success(Duration::from_millis(60));

        let health = tracker.snapshot("binance");
        assert!(health.is_healthy);
        assert_eq!(health.avg_latency_ms, 50);
        assert!(health.last_success.is_some());

        std::thread::sleep(Duration::from_millis(2));
        tracker.record_failure(&DataRetrievalError::AssetNotFound("NOPEUSDT".to_string()));
        let health = tracker.snapshot("binance");
        assert!(!health.is_healthy);
        assert!((health.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!(health.last_error.unwrap().contains("NOPEUSDT"));
    }

    #[test]
    fn test_observe_routes_outcome() {
        let tracker = HealthTracker::new();
        let failed: Result<(), _> = Err(DataRetrievalError::ApiError("down".to_string()));
        tracker.observe(&failed, Duration::ZERO);
        assert_eq!(tracker.snapshot("x").success_rate, 0.0);

        std::thread::sleep(Duration::from_millis(2));
        tracker.observe(&Ok(()), Duration::from_millis(5));
        let health = tracker.snapshot("x");
        assert!(health.is_healthy);
        assert_eq!(health.success_rate, 0.5);
    }
}
