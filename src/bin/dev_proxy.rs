//! Local development proxy for the Replicate handler.
//!
//! Serves only `/api/generate-replicate` over plain HTTP so the UI dev server
//! can reach it without the serverless platform. Jobs may wait up to 180s.

use std::time::Duration;
use tracing_subscriber::EnvFilter;

use looksim::{app_state::AppState, config::AppConfig, routes};

const DEV_MAX_WAIT: Duration = Duration::from_secs(180);

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    if config.replicate_token().is_none() {
        tracing::warn!("REPLICATE_API_TOKEN is not set; requests will answer 500");
    }

    // The dev proxy has no platform timeout in front of it, so the request
    // timeout only needs to outlast the longer poll window.
    let poll = config.poll_config().with_max_wait(DEV_MAX_WAIT);
    let request_timeout = config.request_timeout().max(DEV_MAX_WAIT + Duration::from_secs(30));

    let state = AppState::with_poll_config(&config, poll).expect("Failed to initialize Replicate client");
    let app = routes::finish(routes::replicate_routes(), state, request_timeout);

    let listener = tokio::net::TcpListener::bind(&config.dev_proxy_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!(
        addr = %config.dev_proxy_addr,
        max_wait_secs = DEV_MAX_WAIT.as_secs(),
        "Dev proxy listening"
    );

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
