pub mod config;
pub mod downloader;
pub mod error;
pub mod metrics;
pub mod server;
pub mod store;

pub use config::{ConfigLoader, DaemonConfig};
pub use downloader::{BatchScheduler, FetchOutcome, Fetcher, HttpFetcher, WorkerPool};
pub use error::{Error, Result};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use store::{OrderBy, RankingStore, UrlRecord};
