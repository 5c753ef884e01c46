use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub tasks_submitted: u64,
    pub tasks_completed: u64,
    pub fetches_success: u64,
    pub fetches_failed: u64,
    pub active_fetches: u64,
    pub success_rate: f64,
    pub avg_fetch_time_ms: u64,
    pub uptime_seconds: f64,
}
