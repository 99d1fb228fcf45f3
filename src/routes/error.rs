use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::models::artifact::ArtifactError;
use crate::services::job_client::JobError;
use crate::services::storage::StorageError;

/// Which key carries the detail text in the error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Details,
    Message,
}

/// Error returned by every handler, rendered as `{error, details|message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub detail: Option<String>,
    pub field: DetailField,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            detail: None,
            field: DetailField::Details,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Report the detail under `message` instead of `details`.
    pub fn as_message(mut self) -> Self {
        self.field = DetailField::Message;
        self
    }

    /// Missing credentials for `what`.
    pub fn not_configured(what: &str) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{what} not configured"),
        )
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.detail.as_deref();
        let body = ErrorBody {
            error: &self.error,
            details: detail.filter(|_| self.field == DetailField::Details),
            message: detail.filter(|_| self.field == DetailField::Message),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        let upstream_status = |code: Option<u16>| {
            code.and_then(|c| StatusCode::from_u16(c).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY)
        };

        match err {
            JobError::Submission { status, details } => {
                ApiError::new(upstream_status(status), "Failed to start generation")
                    .with_detail(details)
            }
            JobError::Upstream { status, details } => {
                ApiError::new(upstream_status(Some(status)), "Provider request failed")
                    .with_detail(details)
            }
            JobError::JobFailed(message) => {
                ApiError::new(StatusCode::BAD_GATEWAY, "Generation failed").with_detail(message)
            }
            e @ JobError::Timeout(_) => {
                ApiError::new(StatusCode::GATEWAY_TIMEOUT, "Generation timed out")
                    .with_detail(e.to_string())
            }
            JobError::EmptyOutput => ApiError::new(StatusCode::BAD_GATEWAY, "No image generated"),
            JobError::Fetch(details) => {
                ApiError::new(StatusCode::BAD_GATEWAY, "Failed to fetch generated image")
                    .with_detail(details)
            }
            JobError::InvalidInput(e) => ApiError::bad_request("Invalid image data")
                .with_detail(e.to_string()),
            JobError::Http(e) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    .with_detail(e.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to upload to S3")
            .with_detail(err.to_string())
    }
}

impl From<ArtifactError> for ApiError {
    fn from(err: ArtifactError) -> Self {
        ApiError::bad_request("Invalid image data").with_detail(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("Invalid request body").with_detail(rejection.body_text())
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        ApiError::bad_request("Missing required fields").with_detail(report.to_string())
    }
}
