use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::{
    editor::ImageEditor,
    gemini::GeminiClient,
    job_client::{AsyncJobClient, PollConfig},
    openai::OpenAiClient,
    pipeline::HairPngPipeline,
    replicate::{ReplicateBackend, ReplicateEditor},
    storage::{ObjectStore, S3Store, StorageError},
};

/// Timeout for a single provider HTTP call (not the whole job).
const PROVIDER_CALL_TIMEOUT: Duration = Duration::from_secs(90);

/// Shared application state passed to all route handlers.
///
/// A service is `None` when its credentials are not configured; the handler
/// that needs it answers 500 before touching the network.
#[derive(Clone, Default)]
pub struct AppState {
    pub gemini: Option<Arc<dyn ImageEditor>>,
    pub openai: Option<Arc<dyn ImageEditor>>,
    pub replicate: Option<Arc<dyn ImageEditor>>,
    pub hair_png: Option<Arc<HairPngPipeline>>,
    pub storage: Option<Arc<dyn ObjectStore>>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        Self::with_poll_config(config, config.poll_config())
    }

    /// Build every configured service, running Replicate jobs with `poll`.
    pub fn with_poll_config(config: &AppConfig, poll: PollConfig) -> Result<Self, StateError> {
        let http = Client::builder()
            .timeout(PROVIDER_CALL_TIMEOUT)
            .build()
            .map_err(StateError::Http)?;

        let mut state = Self::default();

        if let Some(key) = config.gemini_key() {
            state.gemini = Some(Arc::new(GeminiClient::new(
                http.clone(),
                &config.gemini_api_base,
                key,
                &config.gemini_model,
            )));
        }

        if let Some(key) = config.openai_key() {
            state.openai = Some(Arc::new(OpenAiClient::new(
                http.clone(),
                &config.openai_api_base,
                key,
                &config.openai_image_model,
            )));
        }

        if let Some(token) = config.replicate_token() {
            let backend = Arc::new(ReplicateBackend::new(
                http.clone(),
                &config.replicate_api_base,
                token,
            ));
            let jobs = AsyncJobClient::new(backend, poll);
            state.replicate = Some(Arc::new(ReplicateEditor::new(
                jobs.clone(),
                &config.replicate_edit_model,
            )));
            state.hair_png = Some(Arc::new(
                HairPngPipeline::new(
                    jobs,
                    &config.replicate_hair_model,
                    &config.replicate_matting_model,
                )
                .with_budget(config.request_budget()),
            ));
        }

        if let Some((region, access_key, secret_key)) = config.aws_credentials() {
            state.storage = Some(Arc::new(S3Store::new(
                &config.s3_bucket,
                region,
                access_key,
                secret_key,
            )?));
        }

        Ok(state)
    }

    /// Names of providers with credentials, for the health endpoint.
    pub fn configured_providers(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for editor in [&self.gemini, &self.openai, &self.replicate].into_iter().flatten() {
            names.push(editor.provider());
        }
        if self.storage.is_some() {
            names.push("s3");
        }
        names
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to build HTTP client: {0}")]
    Http(reqwest::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
