use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Top-level daemon configuration. Every field has a default, so an empty
/// config file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DaemonConfig {
    /// Number of concurrent fetch workers.
    #[serde(default = "default_pool_size")]
    #[validate(range(min = 1))]
    pub pool_size: usize,

    /// Capacity of the bounded task queue; submitters block when it is full.
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    #[serde(default = "default_fetch_timeout")]
    #[validate(range(min = 1))]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default)]
    #[validate]
    pub batch: BatchConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            queue_capacity: default_queue_capacity(),
            fetch_timeout_secs: default_fetch_timeout(),
            listen_addr: default_listen_addr(),
            batch: BatchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchConfig {
    /// Idle time between batch rounds.
    #[serde(default = "default_interval")]
    #[validate(range(min = 1))]
    pub interval_secs: u64,

    /// How many top-ranked URLs each round re-fetches.
    #[serde(default = "default_top_n")]
    #[validate(range(min = 1))]
    pub top_n: usize,

    /// Ranking view the round reads: "count" or "recency".
    #[serde(default = "default_order")]
    #[validate(custom = "validate_order")]
    pub order: String,

    /// Inter-submission delay within a round, to avoid bursting.
    #[serde(default)]
    pub pace_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            top_n: default_top_n(),
            order: default_order(),
            pace_ms: 0,
        }
    }
}

fn validate_order(order: &str) -> Result<(), ValidationError> {
    order
        .parse::<crate::store::OrderBy>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("unknown ordering"))
}

fn default_pool_size() -> usize {
    3
}

fn default_queue_capacity() -> usize {
    64
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_interval() -> u64 {
    30
}

fn default_top_n() -> usize {
    5
}

fn default_order() -> String {
    "count".to_string()
}
