//! Health check endpoints.

use crate::state::AppState;
use axum::{
    Router,
    body::Body,
    response::{IntoResponse, Response},
    routing::get,
};

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness check. Deliberately does not touch MongoDB: the exporter is
/// healthy even while the backup coordinator is unreachable.
async fn health_check() -> impl IntoResponse {
    Response::new(Body::from("OK"))
}
