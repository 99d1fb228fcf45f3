use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;

use crate::models::artifact::Artifact;
use crate::services::editor::{EditRequest, ImageEditor};
use crate::services::job_client::JobError;

/// Client for Gemini image generation (`generateContent`).
pub struct GeminiClient {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    mime_type: String,
    data: String,
}

impl GeminiClient {
    pub fn new(http: Client, api_base: &str, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn request_body(request: &EditRequest) -> serde_json::Value {
        let mut generation_config = serde_json::json!({
            "responseModalities": ["TEXT", "IMAGE"]
        });
        if let Some(seed) = request.settings.seed {
            generation_config["seed"] = serde_json::json!(seed);
        }

        serde_json::json!({
            "contents": [{
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": request.source.mime_type,
                            "data": request.source.to_base64()
                        }
                    },
                    { "text": request.instruction }
                ]
            }],
            "generationConfig": generation_config
        })
    }
}

/// Pull the first inline image out of a `generateContent` response.
fn first_inline_image(response: GenerateContentResponse) -> Result<Artifact, JobError> {
    let inline = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data)
        .ok_or(JobError::EmptyOutput)?;

    let bytes = BASE64
        .decode(inline.data.trim())
        .map_err(|e| JobError::Fetch(format!("invalid inline image: {e}")))?;
    if bytes.is_empty() {
        return Err(JobError::EmptyOutput);
    }
    Ok(Artifact::new(inline.mime_type, bytes))
}

#[async_trait]
impl ImageEditor for GeminiClient {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    async fn edit(&self, request: &EditRequest) -> Result<Artifact, JobError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(request))
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

        let body: GenerateContentResponse = response.json().await?;
        first_inline_image(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::generation::GenerationSettings;
    use serde_json::json;

    #[test]
    fn test_endpoint_includes_model() {
        let client = GeminiClient::new(
            Client::new(),
            "https://generativelanguage.googleapis.com/v1beta/",
            "key",
            "gemini-2.5-flash-image-preview",
        );
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image-preview:generateContent"
        );
    }

    #[test]
    fn test_request_body_carries_image_and_text() {
        let request = EditRequest {
            source: Artifact::new("image/jpeg", b"hello".to_vec()),
            instruction: "undercut".into(),
            settings: GenerationSettings::default(),
        };
        let body = GeminiClient::request_body(&request);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[0]["inline_data"]["data"], "aGVsbG8=");
        assert_eq!(parts[1]["text"], "undercut");
        assert_eq!(body["generationConfig"]["responseModalities"], json!(["TEXT", "IMAGE"]));
    }

    #[test]
    fn test_first_inline_image_skips_text_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is the edited photo." },
                        { "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } }
                    ]
                }
            }]
        }))
        .unwrap();
        let artifact = first_inline_image(response).unwrap();
        assert_eq!(artifact.mime_type, "image/png");
        assert_eq!(artifact.bytes, b"hello");
    }

    #[test]
    fn test_text_only_response_is_empty_output() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't help with that." }] } }]
        }))
        .unwrap();
        assert!(matches!(first_inline_image(response), Err(JobError::EmptyOutput)));
    }
}
