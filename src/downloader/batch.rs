use crate::config::schema::BatchConfig;
use crate::downloader::pool::WorkerPool;
use crate::error::{Error, Result};
use crate::store::{OrderBy, RankingStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Periodic re-verification of the most significant URLs.
///
/// Each round queries the store's top-N, resubmits those URLs to the worker
/// pool (paced, bounded by the pool's own backpressure), waits for the round
/// to drain, then logs per-URL statistics. Popular URLs thereby keep their
/// liveness data fresh and their rank current.
pub struct BatchScheduler {
    store: RankingStore,
    pool: Arc<WorkerPool>,
    interval: Duration,
    top_n: usize,
    order: OrderBy,
    pace: Duration,
}

impl BatchScheduler {
    pub fn new(store: RankingStore, pool: Arc<WorkerPool>, config: &BatchConfig) -> Result<Self> {
        Ok(Self {
            store,
            pool,
            interval: Duration::from_secs(config.interval_secs),
            top_n: config.top_n,
            order: config.order.parse()?,
            pace: Duration::from_millis(config.pace_ms),
        })
    }

    /// Spawns the idle/running loop. Abort the returned handle to stop it, or
    /// let it exit on its own once the store or pool shuts down.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                sleep(self.interval).await;
                match self.run_round().await {
                    Ok(()) => {}
                    Err(Error::StoreClosed) | Err(Error::PoolClosed) => {
                        log::info!("batch: store or pool gone, scheduler exiting");
                        break;
                    }
                    Err(e) => log::warn!("batch: round failed: {}", e),
                }
            }
        })
    }

    /// One batch round. Public so the owning process (and tests) can drive a
    /// round without the interval loop.
    pub async fn run_round(&self) -> Result<()> {
        log::info!("batch: starting batch round");

        let top = self.store.top(self.top_n, self.order).await?;
        if top.is_empty() {
            log::info!("batch: no urls to process");
            return Ok(());
        }

        for record in &top {
            if !self.pace.is_zero() {
                sleep(self.pace).await;
            }
            self.pool.submit(record.url.clone()).await?;
        }

        self.pool.wait().await;

        let snapshot = self.store.top(self.top_n, self.order).await?;
        Self::log_stats(&snapshot);
        Ok(())
    }

    fn log_stats(records: &[crate::store::UrlRecord]) {
        log::info!("batch: round done, download statistics:");
        for record in records {
            log::info!(
                "  {} | count: {} | successes: {} | failures: {} | last latency: {}ms",
                record.url,
                record.count,
                record.successes,
                record.failures,
                record.last_latency_ms
            );
        }
    }
}
