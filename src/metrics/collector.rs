use crate::metrics::snapshot::MetricsSnapshot;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Instant;

/// Lock-free counters for the worker pool. Cheap to clone and update from
/// every fetch task; `snapshot` derives the rates.
#[derive(Clone)]
pub struct MetricsCollector {
    tasks_submitted: Arc<AtomicU64>,
    tasks_completed: Arc<AtomicU64>,
    fetches_success: Arc<AtomicU64>,
    fetches_failed: Arc<AtomicU64>,
    active_fetches: Arc<AtomicU64>,
    total_fetch_time_ms: Arc<AtomicU64>,
    start_time: Arc<Instant>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            tasks_submitted: Arc::new(AtomicU64::new(0)),
            tasks_completed: Arc::new(AtomicU64::new(0)),
            fetches_success: Arc::new(AtomicU64::new(0)),
            fetches_failed: Arc::new(AtomicU64::new(0)),
            active_fetches: Arc::new(AtomicU64::new(0)),
            total_fetch_time_ms: Arc::new(AtomicU64::new(0)),
            start_time: Arc::new(Instant::now()),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_tasks_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_tasks_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_active_fetches(&self) {
        self.active_fetches.fetch_add(1, Ordering::SeqCst);
    }

    pub fn decrement_active_fetches(&self) {
        self.active_fetches.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn record_success(&self, latency_ms: u64) {
        self.fetches_success.fetch_add(1, Ordering::SeqCst);
        self.total_fetch_time_ms
            .fetch_add(latency_ms, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        self.fetches_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let success = self.fetches_success.load(Ordering::SeqCst);
        let failed = self.fetches_failed.load(Ordering::SeqCst);
        let total = success + failed;
        let total_time = self.total_fetch_time_ms.load(Ordering::SeqCst);

        let success_rate = if total > 0 {
            (success as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        let avg_fetch_time_ms = if success > 0 { total_time / success } else { 0 };

        MetricsSnapshot {
            tasks_submitted: self.tasks_submitted.load(Ordering::SeqCst),
            tasks_completed: self.tasks_completed.load(Ordering::SeqCst),
            fetches_success: success,
            fetches_failed: failed,
            active_fetches: self.active_fetches.load(Ordering::SeqCst),
            success_rate,
            avg_fetch_time_ms,
            uptime_seconds: self.start_time.elapsed().as_secs_f64(),
        }
    }
}
