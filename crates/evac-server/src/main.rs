//! Evac Server - always-on backend for fire-aware pedestrian routing

mod api;
mod config;
mod state;

use anyhow::Result;
use axum::routing::get;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::state::AppState;
use evac_router::RouterClient;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("evac_server=debug".parse()?))
        .init();

    tracing::info!("Starting Evac Server...");

    let config = Config::from_env();
    let port = config.server_port;
    if config.router_app_key.is_empty() {
        tracing::warn!("ROUTER_APP_KEY is empty; provider requests will be rejected upstream");
    }

    let router = RouterClient::new(
        config.router_base_url,
        config.router_app_key,
        Duration::from_secs(config.router_timeout_s),
    );
    let state = Arc::new(AppState::new(Arc::new(router), config.detour_policy));

    // Build the app
    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state) // Inject state into all routes
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
