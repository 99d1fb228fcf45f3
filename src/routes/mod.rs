pub mod error;
pub mod generate;
pub mod hair_png;
pub mod health;
pub mod metrics;
pub mod upload;

use axum::body::HttpBody;
use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use error::ApiError;

/// Base64 photos are large; allow up to 10 MB bodies.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Answer to a bare `OPTIONS` request.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Give the bodiless response of the timeout layer a JSON error body.
async fn timeout_body(response: Response) -> Response {
    let bodiless = response.body().size_hint().exact() == Some(0);
    if response.status() == StatusCode::GATEWAY_TIMEOUT && bodiless {
        tracing::warn!("Request exceeded the server timeout");
        return ApiError::new(StatusCode::GATEWAY_TIMEOUT, "Request timed out").into_response();
    }
    response
}

/// POST-only endpoint that also answers OPTIONS and rejects other methods.
fn api_endpoint<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    post(handler)
        .options(preflight)
        .fallback(method_not_allowed)
}

/// All generation and upload endpoints.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/generate", api_endpoint(generate::generate_gemini))
        .route(
            "/api/generate-replicate",
            api_endpoint(generate::generate_replicate),
        )
        .route("/api/generate-openai", api_endpoint(generate::generate_openai))
        .route("/api/generate-hair-png", api_endpoint(hair_png::generate_hair_png))
        .route("/api/upload-to-s3", api_endpoint(upload::upload_to_s3))
        .route("/health", get(health::health_check))
}

/// Only the Replicate handler, as served by the local development proxy.
pub fn replicate_routes() -> Router<AppState> {
    Router::new().route(
        "/api/generate-replicate",
        api_endpoint(generate::generate_replicate),
    )
}

/// Attach state and the shared middleware stack.
pub fn finish(routes: Router<AppState>, state: AppState, request_timeout: Duration) -> Router {
    routes
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::map_response(timeout_body))
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
}
