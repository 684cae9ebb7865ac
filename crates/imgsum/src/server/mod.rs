//! HTTP upload API.
//!
//! `POST /summarize` takes multipart uploads in the `images` field, `GET
//! /config` reports the summarizer wiring, and `GET /health` is a liveness
//! probe.

mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use imgsum_core::ImageSummarizer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
pub const MAX_BODY_SIZE: usize = 100 * 1024 * 1024;

/// Shared state for all handlers.
pub struct AppState {
    pub summarizer: ImageSummarizer,
}

/// Build the router with CORS, tracing and the upload limit applied.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summarize", post(handlers::summarize))
        .route("/config", get(handlers::config))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}
