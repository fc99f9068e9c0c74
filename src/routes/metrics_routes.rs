//! Metrics exposition endpoint.

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::error;

use crate::state::AppState;

/// Overall deadline for one scrape, matching the HTTP read/write
/// timeouts of the original exporter. A scrape that exceeds it is
/// abandoned; the per-scrape connection is dropped with it.
const SCRAPE_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates the metrics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Handler for the /metrics endpoint.
///
/// Each request triggers one reconciliation pass against the PBM status
/// collections and returns the rendered exposition text. Read failures
/// surface as a plain-text 500 so the scraper records the target as down.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match tokio::time::timeout(SCRAPE_TIMEOUT, state.exporter.scrape()).await {
        Ok(Ok(body)) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Ok(Err(e)) => {
            error!("Error updating metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
        Err(_) => {
            error!("Scrape timed out after {:?}", SCRAPE_TIMEOUT);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
