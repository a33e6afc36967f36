//! Scrape endpoint

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use ynab_infra::PrometheusSink;

/// State shared with the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub sink: Arc<PrometheusSink>,
}

impl AppState {
    pub fn new(sink: Arc<PrometheusSink>) -> Self {
        Self { sink }
    }
}

pub struct Server {
    port: u16,
    state: AppState,
}

impl Server {
    pub fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }

    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let app = build_router(self.state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("Failed to bind metrics server")?;

        info!("Metrics server listening on {}", addr);

        axum::serve(listener, app.into_make_service())
            .await
            .context("Metrics server error")?;

        Ok(())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Route handlers

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "YNAB Exporter",
        "version": env!("CARGO_PKG_VERSION"),
        "metrics": "/metrics"
    }))
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.sink.render() {
        Ok(body) => ([(header::CONTENT_TYPE, state.sink.content_type())], body).into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
