use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::models::generation::{HairPngRequest, HairPngResponse};
use crate::routes::error::ApiError;

/// POST /api/generate-hair-png: render a hair overlay and cut out its background.
///
/// When background removal fails the rendered image is still returned, with
/// `hasTransparency: false`.
pub async fn generate_hair_png(
    State(state): State<AppState>,
    payload: Result<Json<HairPngRequest>, JsonRejection>,
) -> Result<Json<HairPngResponse>, ApiError> {
    let pipeline = state
        .hair_png
        .as_ref()
        .ok_or_else(|| ApiError::not_configured("Replicate API token"))?;

    let Json(request) = payload?;
    request.validate()?;

    tracing::info!(gender = %request.gender, "Hair PNG requested");
    metrics::counter!("generation_requests_total", "provider" => "replicate_hair_png").increment(1);

    let hair = pipeline
        .render(&request.style_prompt, request.gender)
        .await
        .map_err(|e| {
            metrics::counter!(
                "generation_failures_total",
                "provider" => "replicate_hair_png",
                "kind" => e.kind()
            )
            .increment(1);
            tracing::error!(error = %e, "Hair PNG generation failed");
            ApiError::from(e)
        })?;

    tracing::info!(
        has_transparency = hair.has_transparency,
        bytes = hair.artifact.bytes.len(),
        "Hair PNG complete"
    );

    Ok(Json(HairPngResponse {
        success: true,
        hair_png_url: hair.artifact.to_data_uri(),
        has_transparency: hair.has_transparency,
    }))
}
