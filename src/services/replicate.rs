use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::models::artifact::Artifact;
use crate::models::job::{error_text, output_references, Job, JobStatus};
use crate::services::editor::{EditRequest, ImageEditor};
use crate::services::job_client::{AsyncJobClient, JobBackend, JobError, JobInput};

/// Replicate predictions API.
pub struct ReplicateBackend {
    http: Client,
    api_base: String,
    api_token: String,
}

/// Prediction resource as returned by create and get.
#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
}

impl Prediction {
    fn into_job(self) -> Job {
        Job::observed(
            self.id,
            JobStatus::from_provider(&self.status),
            output_references(&self.output),
            error_text(&self.error),
        )
    }
}

impl ReplicateBackend {
    pub fn new(http: Client, api_base: &str, api_token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }

    /// Endpoint and body for creating a prediction.
    ///
    /// `owner/name` runs the model's latest version; `owner/name:version`
    /// pins a version through the generic predictions endpoint.
    fn creation_request(&self, input: &JobInput) -> (String, Value) {
        match input.model.split_once(':') {
            Some((_, version)) => (
                format!("{}/predictions", self.api_base),
                json!({ "version": version, "input": input.input }),
            ),
            None => (
                format!("{}/models/{}/predictions", self.api_base, input.model),
                json!({ "input": input.input }),
            ),
        }
    }

    fn prediction_url(&self, job_id: &str) -> String {
        format!("{}/predictions/{}", self.api_base, job_id)
    }
}

#[async_trait]
impl JobBackend for ReplicateBackend {
    fn name(&self) -> &'static str {
        "replicate"
    }

    async fn submit(&self, input: &JobInput) -> Result<Job, JobError> {
        let (endpoint, body) = self.creation_request(input);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| JobError::Submission {
                status: None,
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(JobError::Submission {
                status: Some(status.as_u16()),
                details,
            });
        }

        let prediction: Prediction = response.json().await.map_err(|e| JobError::Submission {
            status: None,
            details: format!("unreadable prediction: {e}"),
        })?;
        Ok(prediction.into_job())
    }

    async fn status(&self, job_id: &str) -> Result<Job, JobError> {
        let response = self
            .http
            .get(self.prediction_url(job_id))
            .bearer_auth(&self.api_token)
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

        let prediction: Prediction = response.json().await?;
        Ok(prediction.into_job())
    }

    async fn fetch_asset(&self, url: &str) -> Result<Artifact, JobError> {
        fetch_image(&self.http, url).await
    }
}

/// Download an image, taking its type from `Content-Type` unless the header
/// is missing or generic.
pub async fn fetch_image(http: &Client, url: &str) -> Result<Artifact, JobError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| JobError::Fetch(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(JobError::Fetch(format!("{url} returned {status}")));
    }

    let mime_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
        .filter(|value| value.starts_with("image/"));

    let bytes = response
        .bytes()
        .await
        .map_err(|e| JobError::Fetch(format!("{url}: {e}")))?
        .to_vec();
    if bytes.is_empty() {
        return Err(JobError::Fetch(format!("{url} returned an empty body")));
    }

    Ok(match mime_type {
        Some(mime_type) => Artifact::new(mime_type, bytes),
        None => Artifact::sniffed(bytes),
    })
}

/// Image editing through an instruction-following Replicate model.
pub struct ReplicateEditor {
    jobs: AsyncJobClient,
    model: String,
}

impl ReplicateEditor {
    pub fn new(jobs: AsyncJobClient, model: impl Into<String>) -> Self {
        Self {
            jobs,
            model: model.into(),
        }
    }

    fn job_input(&self, request: &EditRequest) -> JobInput {
        let mut input = Map::new();
        input.insert("prompt".into(), json!(request.instruction));
        input.insert("input_image".into(), json!(request.source.to_data_uri()));
        input.insert(
            "output_format".into(),
            json!(request.settings.output_format.as_deref().unwrap_or("png")),
        );
        if let Some(seed) = request.settings.seed {
            input.insert("seed".into(), json!(seed));
        }
        JobInput::new(&self.model, Value::Object(input))
    }
}

#[async_trait]
impl ImageEditor for ReplicateEditor {
    fn provider(&self) -> &'static str {
        "replicate"
    }

    async fn edit(&self, request: &EditRequest) -> Result<Artifact, JobError> {
        self.jobs.run_job(&self.job_input(request)).await
    }
}
