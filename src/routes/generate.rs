use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use garde::Validate;
use std::sync::Arc;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::artifact::Artifact;
use crate::models::generation::{GenerateRequest, GenerateResponse};
use crate::routes::error::ApiError;
use crate::services::editor::{EditRequest, ImageEditor};
use crate::services::prompt;

/// POST /api/generate: hairstyle edit through Gemini.
///
/// Errors on this endpoint report their detail under `message`.
pub async fn generate_gemini(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    generate_with(state.gemini.as_ref(), "Gemini API key", payload)
        .await
        .map_err(ApiError::as_message)
}

/// POST /api/generate-replicate: hairstyle edit through a Replicate job.
pub async fn generate_replicate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    generate_with(state.replicate.as_ref(), "Replicate API token", payload).await
}

/// POST /api/generate-openai: hairstyle edit through OpenAI image edits.
pub async fn generate_openai(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    generate_with(state.openai.as_ref(), "OpenAI API key", payload).await
}

async fn generate_with(
    editor: Option<&Arc<dyn ImageEditor>>,
    credential: &str,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let editor = editor.ok_or_else(|| ApiError::not_configured(credential))?;
    let provider = editor.provider();

    let Json(request) = payload?;
    request.validate()?;
    let source = Artifact::from_base64(&request.image)?;

    let request_id = Uuid::new_v4();
    tracing::info!(
        %request_id,
        provider,
        style_id = request.style_id.as_deref().unwrap_or("custom"),
        source_bytes = source.bytes.len(),
        "Generation requested"
    );
    metrics::counter!("generation_requests_total", "provider" => provider).increment(1);

    let edit = EditRequest {
        source,
        instruction: prompt::edit_instruction(&request.prompt),
        settings: request.settings,
    };

    let start = std::time::Instant::now();
    match editor.edit(&edit).await {
        Ok(result) => {
            tracing::info!(
                %request_id,
                provider,
                duration_ms = start.elapsed().as_millis() as u64,
                result_bytes = result.bytes.len(),
                "Generation complete"
            );
            Ok(Json(GenerateResponse {
                success: true,
                result_image: result.to_data_uri(),
            }))
        }
        Err(e) => {
            metrics::counter!(
                "generation_failures_total",
                "provider" => provider,
                "kind" => e.kind()
            )
            .increment(1);
            tracing::error!(%request_id, provider, error = %e, "Generation failed");
            Err(e.into())
        }
    }
}
