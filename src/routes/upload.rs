use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::models::artifact::Artifact;
use crate::models::generation::{UploadRequest, UploadResponse};
use crate::routes::error::ApiError;

/// POST /api/upload-to-s3: store a reference image in the asset bucket.
///
/// Errors on this endpoint report their detail under `message`.
pub async fn upload_to_s3(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    upload(state, payload).await.map_err(ApiError::as_message)
}

async fn upload(
    state: AppState,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| ApiError::not_configured("AWS credentials"))?;

    let Json(request) = payload?;
    request.validate()?;
    let key = object_key(&request.file_name)?;

    let artifact = Artifact::from_base64(&request.image_data)?;
    let content_type = request
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(&artifact.mime_type)
        .to_string();

    let url = storage.put(&key, &artifact.bytes, &content_type).await?;

    tracing::info!(key = %key, content_type = %content_type, bytes = artifact.bytes.len(), "Uploaded to S3");

    Ok(Json(UploadResponse {
        success: true,
        url,
        file_name: key,
    }))
}

/// Validate a client-supplied file name as a bucket key.
fn object_key(file_name: &str) -> Result<String, ApiError> {
    let key = file_name.trim().trim_start_matches('/');
    let traverses = key.split('/').any(|segment| segment == ".." || segment.is_empty());
    if key.is_empty() || traverses || key.contains('\\') {
        return Err(ApiError::bad_request("Invalid file name").with_detail(file_name.to_string()));
    }
    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_accepts_nested_names() {
        assert_eq!(object_key("styles/bob.png").unwrap(), "styles/bob.png");
        assert_eq!(object_key("/bob.png").unwrap(), "bob.png");
    }

    #[test]
    fn test_object_key_rejects_traversal() {
        assert!(object_key("../secrets.png").is_err());
        assert!(object_key("styles//bob.png").is_err());
        assert!(object_key("a\\b.png").is_err());
        assert!(object_key("   ").is_err());
    }
}
