use std::path::Path;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::{self, SharedState};
use crate::config::ServerConfig;

pub fn app(state: SharedState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new().nest("/api", api::router(state));
    if Path::new(static_dir).is_dir() {
        app = app.fallback_service(ServeDir::new(static_dir));
    } else {
        tracing::warn!("Static directory {} not found, serving the API only", static_dir);
    }

    app.layer(TraceLayer::new_for_http()).layer(cors)
}

pub async fn run(server: &ServerConfig, state: SharedState) -> Result<()> {
    let app = app(state, &server.static_dir);

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", server.port);
    axum::serve(listener, app)
        .await
        .context("Web server stopped unexpectedly")
}
