//! HTTP boundary: URL submission and ranked listings.
//!
//! Thin adapter over the core. Handlers validate input, then call the pool
//! or the store handle. Nothing malformed reaches either.

mod handlers;
mod routes;

pub use routes::create_router;

use crate::downloader::WorkerPool;
use crate::error::Result;
use crate::store::RankingStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub store: RankingStore,
    pub pool: Arc<WorkerPool>,
}

/// Start the web server; returns once `shutdown` resolves and in-flight
/// requests finish.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("http: now serving on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    log::info!("http: shutdown complete");
    Ok(())
}
