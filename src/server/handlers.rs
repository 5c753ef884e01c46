use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::AppState;
use crate::store::OrderBy;

#[derive(Debug, Deserialize)]
pub struct SubmitUrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TopUrlsParams {
    pub sort_by: Option<String>,
    pub get_n: Option<i64>,
}

/// `POST /submiturl`: validate and enqueue a download task. Submission is
/// fire-and-forget: a later fetch failure only ever shows up in the URL's
/// failure counter, never as an error here.
pub async fn submit_url(
    State(state): State<AppState>,
    Json(request): Json<SubmitUrlRequest>,
) -> Response {
    if !is_valid_url(&request.url) {
        return (
            StatusCode::BAD_REQUEST,
            format!("invalid url: {:?}", request.url),
        )
            .into_response();
    }

    match state.pool.submit(request.url).await {
        Ok(()) => Json(json!({"message": "url submitted"})).into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

/// `GET /topurls?sort_by=count|recency&get_n=N`: ranked listing.
pub async fn top_urls(
    State(state): State<AppState>,
    Query(params): Query<TopUrlsParams>,
) -> Response {
    let order: OrderBy = match params.sort_by.as_deref().unwrap_or("").parse() {
        Ok(order) => order,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let n = match params.get_n {
        Some(n) if n > 0 => n as usize,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                "get_n must be a positive integer".to_string(),
            )
                .into_response()
        }
    };

    match state.store.top(n, order).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

/// `GET /status`: store size plus fetch metrics.
pub async fn status(State(state): State<AppState>) -> Response {
    let tracked_urls = match state.store.len().await {
        Ok(len) => len,
        Err(e) => return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    };

    Json(json!({
        "tracked_urls": tracked_urls,
        "fetch": state.pool.metrics().snapshot(),
    }))
    .into_response()
}

/// A submission is accepted only with a parseable absolute URL carrying a
/// host. Everything else is rejected before it reaches the core.
fn is_valid_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(parsed) => parsed.has_host(),
        Err(_) => false,
    }
}
