use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/submiturl", post(handlers::submit_url))
        .route("/topurls", get(handlers::top_urls))
        .route("/status", get(handlers::status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
