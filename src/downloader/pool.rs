use crate::downloader::fetcher::Fetcher;
use crate::error::{Error, Result};
use crate::metrics::MetricsCollector;
use crate::store::RankingStore;
use futures::stream::StreamExt;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

/// Bounded pool of concurrent fetch workers.
///
/// Tasks enter a bounded queue; a driver task consumes it with at most
/// `pool_size` fetches in flight. Every outcome is reported synchronously to
/// the ranking store before the slot frees. `submit` blocks when the queue is
/// full: backpressure, never load shedding.
pub struct WorkerPool {
    tx: Mutex<Option<mpsc::Sender<String>>>,
    pending_tx: watch::Sender<usize>,
    driver: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    metrics: MetricsCollector,
}

impl WorkerPool {
    pub fn spawn(
        pool_size: usize,
        queue_capacity: usize,
        fetcher: Arc<dyn Fetcher>,
        store: RankingStore,
        metrics: MetricsCollector,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let (pending_tx, _) = watch::channel(0usize);

        let driver = tokio::spawn(Self::run_workers(
            rx,
            pool_size,
            fetcher,
            store,
            metrics.clone(),
            pending_tx.clone(),
        ));

        Arc::new(Self {
            tx: Mutex::new(Some(tx)),
            pending_tx,
            driver: tokio::sync::Mutex::new(Some(driver)),
            metrics,
        })
    }

    async fn run_workers(
        rx: mpsc::Receiver<String>,
        pool_size: usize,
        fetcher: Arc<dyn Fetcher>,
        store: RankingStore,
        metrics: MetricsCollector,
        pending_tx: watch::Sender<usize>,
    ) {
        ReceiverStream::new(rx)
            .for_each_concurrent(pool_size, |url| {
                let fetcher = fetcher.clone();
                let store = store.clone();
                let metrics = metrics.clone();
                let pending_tx = pending_tx.clone();

                async move {
                    metrics.increment_active_fetches();
                    log::debug!("pool: starting download of {}", url);

                    let outcome = fetcher.fetch(&url).await;
                    if outcome.success {
                        metrics.record_success(outcome.latency_ms);
                    } else {
                        metrics.record_failure();
                    }

                    // Synchronous report keeps per-worker ordering intact.
                    if let Err(e) = store
                        .update(&url, outcome.success, outcome.latency_ms)
                        .await
                    {
                        log::warn!("pool: outcome for {} not recorded: {}", url, e);
                    }

                    metrics.increment_tasks_completed();
                    metrics.decrement_active_fetches();
                    pending_tx.send_modify(|pending| *pending -= 1);
                }
            })
            .await;
        log::debug!("pool: workers drained");
    }

    /// Enqueues a fetch task. Suspends while the queue is full; fails with
    /// `PoolClosed` once `shutdown` has begun. Cancel-safe: an abandoned call
    /// leaves no trace.
    pub async fn submit(&self, url: String) -> Result<()> {
        let tx = self
            .tx
            .lock()
            .expect("pool submit lock poisoned")
            .clone()
            .ok_or(Error::PoolClosed)?;

        let permit = tx.reserve().await.map_err(|_| Error::PoolClosed)?;
        // Count the task before it becomes visible to workers so `wait` can
        // never observe an accepted-but-uncounted task.
        self.pending_tx.send_modify(|pending| *pending += 1);
        self.metrics.increment_tasks_submitted();
        log::debug!("pool: queued download of {}", url);
        permit.send(url);
        Ok(())
    }

    /// Blocks until every accepted task has completed processing.
    pub async fn wait(&self) {
        let mut pending = self.pending_tx.subscribe();
        let _ = pending.wait_for(|pending| *pending == 0).await;
    }

    /// Stops accepting new tasks, drains queued and in-flight work, then
    /// returns. Returns immediately when nothing is queued. Idempotent.
    pub async fn shutdown(&self) {
        log::info!("pool: attempting graceful shutdown");
        {
            self.tx.lock().expect("pool submit lock poisoned").take();
        }
        let driver = self.driver.lock().await.take();
        if let Some(driver) = driver {
            let _ = driver.await;
        }
        log::info!("pool: shutdown complete");
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }
}
