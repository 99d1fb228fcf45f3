use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tracing_subscriber::EnvFilter;

use looksim::app_state::AppState;
use looksim::config::AppConfig;
use looksim::routes;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing looksim server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!(
        "generation_requests_total",
        "Generation requests received, by provider"
    );
    metrics::describe_counter!(
        "generation_failures_total",
        "Generation requests that ended in an error, by provider and kind"
    );
    metrics::describe_counter!("job_polls_total", "Provider job status reads");
    metrics::describe_histogram!(
        "job_wait_seconds",
        "Time from first poll to a terminal job status or timeout"
    );
    metrics::describe_counter!(
        "pipeline_fallbacks_total",
        "Optional pipeline stages that failed and fell back to the previous artifact"
    );

    let poll = config.poll_config();
    tracing::info!(
        poll_interval_secs = poll.interval.as_secs(),
        poll_max_wait_secs = poll.max_wait.as_secs(),
        request_timeout_secs = config.request_timeout_secs,
        "Job polling configured"
    );

    let state = AppState::from_config(&config).expect("Failed to initialize provider clients");
    let providers = state.configured_providers();
    if providers.is_empty() {
        tracing::warn!("No provider credentials configured; every endpoint will answer 500");
    } else {
        tracing::info!(?providers, "Providers configured");
    }

    let app = routes::finish(routes::api_routes(), state, config.request_timeout())
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(CompressionLayer::new());

    tracing::info!("Starting looksim on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
