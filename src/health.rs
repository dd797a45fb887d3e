//! Liveness endpoint for the hosting platform.
//!
//! `GET /health` answers `200 OK` with a plain-text body; every other path is a
//! bare 404.

use anyhow::{Context, Result};
use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

async fn health() -> &'static str {
    "OK"
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(not_found)
}

/// Serve the health router on an already-bound listener
pub async fn serve_on(listener: TcpListener) -> Result<()> {
    axum::serve(listener, router())
        .await
        .context("Health server failed")
}

/// Bind `0.0.0.0:port` and serve until the process exits
pub async fn serve(port: u16) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind health server on port {}", port))?;

    info!("Health server running on port {}", port);
    serve_on(listener).await
}
