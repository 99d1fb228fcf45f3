use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::models::artifact::{Artifact, ArtifactError};
use crate::services::editor::{EditRequest, ImageEditor};
use crate::services::job_client::JobError;
use crate::services::replicate::fetch_image;

const DEFAULT_SIZE: &str = "1024x1024";

/// Client for the OpenAI image edits endpoint.
pub struct OpenAiClient {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
}

/// Where the edited image can be found.
#[derive(Debug, PartialEq)]
enum EditedImage {
    Inline(Artifact),
    Remote(String),
}

impl OpenAiClient {
    pub fn new(http: Client, api_base: &str, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn form(&self, request: &EditRequest) -> Result<Form, JobError> {
        let image = Part::bytes(request.source.bytes.clone())
            .file_name(format!("source.{}", request.source.extension()))
            .mime_str(&request.source.mime_type)
            .map_err(|_| ArtifactError::InvalidMime(request.source.mime_type.clone()))?;

        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("prompt", request.instruction.clone())
            .text("n", "1")
            .text(
                "size",
                request
                    .settings
                    .size
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SIZE.to_string()),
            )
            .part("image", image);
        if let Some(quality) = &request.settings.quality {
            form = form.text("quality", quality.clone());
        }
        Ok(form)
    }
}

fn first_image(response: ImagesResponse) -> Result<EditedImage, JobError> {
    let first = response.data.into_iter().next().ok_or(JobError::EmptyOutput)?;

    if let Some(b64) = first.b64_json.filter(|v| !v.trim().is_empty()) {
        let bytes = BASE64
            .decode(b64.trim())
            .map_err(|e| JobError::Fetch(format!("invalid inline image: {e}")))?;
        return Ok(EditedImage::Inline(Artifact::sniffed(bytes)));
    }
    match first.url.filter(|v| !v.trim().is_empty()) {
        Some(url) => Ok(EditedImage::Remote(url)),
        None => Err(JobError::EmptyOutput),
    }
}

#[async_trait]
impl ImageEditor for OpenAiClient {
    fn provider(&self) -> &'static str {
        "openai"
    }

    async fn edit(&self, request: &EditRequest) -> Result<Artifact, JobError> {
        let response = self
            .http
            .post(format!("{}/images/edits", self.api_base))
            .bearer_auth(&self.api_key)
            .multipart(self.form(request)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(JobError::Upstream {
                status: status.as_u16(),
                details,
            });
        }

        let body: ImagesResponse = response.json().await?;
        match first_image(body)? {
            EditedImage::Inline(artifact) => Ok(artifact),
            EditedImage::Remote(url) => fetch_image(&self.http, &url).await,
        }
    }
}
