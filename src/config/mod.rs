use serde::Deserialize;
use std::time::Duration;

use crate::services::job_client::PollConfig;

/// Headroom left between the internal poll deadline and the HTTP request timeout.
const TIMEOUT_HEADROOM_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Bind address for the local development proxy.
    #[serde(default = "default_dev_proxy_addr")]
    pub dev_proxy_addr: String,

    /// Gemini API key. `VITE_GEMINI_API_KEY` is accepted as a fallback.
    pub gemini_api_key: Option<String>,
    pub vite_gemini_api_key: Option<String>,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Replicate API token
    pub replicate_api_token: Option<String>,

    /// AWS region for the asset bucket
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,

    /// S3 bucket holding reference images
    #[serde(default = "default_s3_bucket")]
    pub s3_bucket: String,

    #[serde(default = "default_replicate_api_base")]
    pub replicate_api_base: String,

    #[serde(default = "default_gemini_api_base")]
    pub gemini_api_base: String,

    #[serde(default = "default_openai_api_base")]
    pub openai_api_base: String,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_openai_image_model")]
    pub openai_image_model: String,

    #[serde(default = "default_replicate_edit_model")]
    pub replicate_edit_model: String,

    #[serde(default = "default_replicate_hair_model")]
    pub replicate_hair_model: String,

    #[serde(default = "default_replicate_matting_model")]
    pub replicate_matting_model: String,

    /// Seconds between job status reads
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Upper bound on a single job's wait, measured from the first poll
    #[serde(default = "default_poll_max_wait_secs")]
    pub poll_max_wait_secs: u64,

    /// Whole-request timeout enforced by the HTTP layer
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_dev_proxy_addr() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_s3_bucket() -> String {
    "looksim-hairstyles".to_string()
}

fn default_replicate_api_base() -> String {
    "https://api.replicate.com/v1".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash-image-preview".to_string()
}

fn default_openai_image_model() -> String {
    "gpt-image-1".to_string()
}

fn default_replicate_edit_model() -> String {
    "black-forest-labs/flux-kontext-pro".to_string()
}

fn default_replicate_hair_model() -> String {
    "black-forest-labs/flux-schnell".to_string()
}

fn default_replicate_matting_model() -> String {
    "851-labs/background-remover".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_poll_max_wait_secs() -> u64 {
    120
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn gemini_key(&self) -> Option<&str> {
        non_empty(&self.gemini_api_key).or_else(|| non_empty(&self.vite_gemini_api_key))
    }

    pub fn openai_key(&self) -> Option<&str> {
        non_empty(&self.openai_api_key)
    }

    pub fn replicate_token(&self) -> Option<&str> {
        non_empty(&self.replicate_api_token)
    }

    /// Region, access key and secret, only when all three are set.
    pub fn aws_credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            non_empty(&self.aws_region)?,
            non_empty(&self.aws_access_key_id)?,
            non_empty(&self.aws_secret_access_key)?,
        ))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Time a handler may spend on provider work, leaving headroom below
    /// the request timeout for the response itself.
    pub fn request_budget(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .saturating_sub(TIMEOUT_HEADROOM_SECS)
                .max(1),
        )
    }

    /// Poll settings with `max_wait` clamped to the request budget, so a
    /// job gives up on its own before the HTTP layer cuts the connection.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig::new(
            Duration::from_secs(self.poll_interval_secs.max(1)),
            Duration::from_secs(self.poll_max_wait_secs).min(self.request_budget()),
        )
    }
}
