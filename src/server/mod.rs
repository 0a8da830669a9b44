//! HTTP surface: router construction and the serve loop

pub mod handlers;

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

use crate::core::CurrencyRateProvider;
use crate::core::config::ServerConfig;

/// Shared, immutable per-process state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CurrencyRateProvider>,
}

/// Builds the application router once, at startup.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/convert",
            get(handlers::convert).post(handlers::convert_form),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Serves `app` on an already bound listener until Ctrl-C.
pub async fn serve_on(listener: TcpListener, app: Router) -> Result<()> {
    let addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

pub async fn serve(config: &ServerConfig, provider: Arc<dyn CurrencyRateProvider>) -> Result<()> {
    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    serve_on(listener, router(AppState { provider })).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
