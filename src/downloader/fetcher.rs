use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Outcome of one fetch attempt. Body content is never retained; only the
/// success signal and timing matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    pub success: bool,
    pub latency_ms: u64,
}

impl FetchOutcome {
    pub fn success(latency_ms: u64) -> Self {
        Self {
            success: true,
            latency_ms,
        }
    }

    pub fn failure() -> Self {
        Self {
            success: false,
            latency_ms: 0,
        }
    }
}

/// The seam between the worker pool and the network. Fetch errors are part of
/// the outcome, never propagated; a failed fetch must not abort a worker.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Real fetcher: GET the URL, drain and discard the body, measure wall-clock
/// latency. Success requires a clean transfer and a 2xx status.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("urlrank/0.1")
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let start = Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::debug!("fetch failed for {}: {}", url, e);
                return FetchOutcome::failure();
            }
        };

        let status = response.status();
        if let Err(e) = response.bytes().await {
            log::debug!("fetch body failed for {}: {}", url, e);
            return FetchOutcome::failure();
        }

        if status.is_success() {
            FetchOutcome::success(start.elapsed().as_millis() as u64)
        } else {
            log::debug!("fetch for {} returned {}", url, status);
            FetchOutcome::failure()
        }
    }
}
