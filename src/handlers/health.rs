//! Health check endpoint handler.

use axum::{http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

/// Handler for the /health endpoint.
///
/// Liveness only: the process serves requests, whatever the last fetch cycle did.
#[instrument]
pub async fn health_handler() -> impl IntoResponse {
    debug!("Processing /health request");
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        "ok",
    )
}
