//! Create-then-poll driver for asynchronous provider jobs.
//!
//! A job is submitted once, its status is read at a fixed interval until it
//! reaches a terminal state or the wait budget runs out, and the first output
//! reference is fetched into an [`Artifact`].

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};

use crate::models::artifact::{Artifact, ArtifactError};
use crate::models::job::{Job, JobStatus};

/// Message used when a provider marks a job failed without saying why.
const GENERIC_FAILURE: &str = "Prediction failed";

/// Provider payload for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInput {
    /// `owner/name` or `owner/name:version`.
    pub model: String,
    pub input: Value,
}

impl JobInput {
    pub fn new(model: impl Into<String>, input: Value) -> Self {
        Self {
            model: model.into(),
            input,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    pub fn with_max_wait(self, max_wait: Duration) -> Self {
        Self { max_wait, ..self }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(120))
    }
}

/// Remote side of a job: creation, status reads and asset download.
#[async_trait]
pub trait JobBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn submit(&self, input: &JobInput) -> Result<Job, JobError>;

    async fn status(&self, job_id: &str) -> Result<Job, JobError>;

    async fn fetch_asset(&self, url: &str) -> Result<Artifact, JobError>;
}

/// Runs jobs against one backend with a bounded wait.
#[derive(Clone)]
pub struct AsyncJobClient {
    backend: Arc<dyn JobBackend>,
    poll: PollConfig,
}

impl AsyncJobClient {
    pub fn new(backend: Arc<dyn JobBackend>, poll: PollConfig) -> Self {
        Self { backend, poll }
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Submit, wait for a terminal status, and fetch the first output.
    pub async fn run_job(&self, input: &JobInput) -> Result<Artifact, JobError> {
        self.run_job_within(input, self.poll.max_wait).await
    }

    /// Like [`run_job`](Self::run_job), with the wait capped at `max_wait`.
    pub async fn run_job_within(
        &self,
        input: &JobInput,
        max_wait: Duration,
    ) -> Result<Artifact, JobError> {
        let provider = self.backend.name();
        let poll = self.poll.with_max_wait(self.poll.max_wait.min(max_wait));
        let submitted = self.backend.submit(input).await?;
        let job_id = submitted.id.trim();
        if job_id.is_empty() {
            return Err(JobError::Submission {
                status: None,
                details: "provider returned no job id".to_string(),
            });
        }

        tracing::info!(provider, job_id, model = %input.model, "Job submitted");

        let job = self.await_terminal(job_id, poll).await?;
        let reference = job.first_output().ok_or(JobError::EmptyOutput)?;
        self.fetch(reference).await
    }

    /// Poll until terminal. A status read still pending one interval past
    /// the deadline counts as a timeout.
    async fn await_terminal(&self, job_id: &str, poll: PollConfig) -> Result<Job, JobError> {
        let provider = self.backend.name();
        let started = Instant::now();
        let deadline = started + poll.max_wait;

        loop {
            let read = timeout_at(deadline + poll.interval, self.backend.status(job_id));
            let job = match read.await {
                Ok(read) => read?,
                Err(_) => {
                    record_wait(provider, "timeout", started);
                    tracing::warn!(provider, job_id, "Status read outlived the deadline, giving up");
                    return Err(JobError::Timeout(poll.max_wait));
                }
            };
            metrics::counter!("job_polls_total", "provider" => provider).increment(1);

            match job.status {
                JobStatus::Succeeded => {
                    record_wait(provider, "succeeded", started);
                    tracing::info!(provider, job_id, "Job succeeded");
                    return Ok(job);
                }
                JobStatus::Failed | JobStatus::Canceled => {
                    record_wait(provider, "failed", started);
                    let message = job
                        .error
                        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                    tracing::warn!(provider, job_id, status = %job.status, error = %message, "Job failed");
                    return Err(JobError::JobFailed(message));
                }
                JobStatus::Queued | JobStatus::Running => {}
            }

            let elapsed = started.elapsed();
            if elapsed >= poll.max_wait {
                record_wait(provider, "timeout", started);
                tracing::warn!(
                    provider,
                    job_id,
                    max_wait_secs = poll.max_wait.as_secs(),
                    "Job did not finish in time, giving up"
                );
                return Err(JobError::Timeout(poll.max_wait));
            }

            tracing::debug!(provider, job_id, status = %job.status, "Job still in flight");
            sleep(poll.interval.min(poll.max_wait - elapsed)).await;
        }
    }

    async fn fetch(&self, reference: &str) -> Result<Artifact, JobError> {
        if reference.starts_with("data:") {
            return Artifact::from_data_uri(reference)
                .map_err(|e| JobError::Fetch(format!("invalid inline output: {e}")));
        }
        self.backend.fetch_asset(reference).await
    }
}

fn record_wait(provider: &'static str, outcome: &'static str, started: Instant) {
    metrics::histogram!("job_wait_seconds", "provider" => provider, "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Job submission failed: {details}")]
    Submission { status: Option<u16>, details: String },

    #[error("Provider request failed ({status}): {details}")]
    Upstream { status: u16, details: String },

    #[error("{0}")]
    JobFailed(String),

    #[error("Job did not complete within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Provider returned no output")]
    EmptyOutput,

    #[error("Failed to fetch result asset: {0}")]
    Fetch(String),

    #[error("Invalid image input: {0}")]
    InvalidInput(#[from] ArtifactError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl JobError {
    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Submission { .. } => "submission",
            JobError::Upstream { .. } => "upstream",
            JobError::JobFailed(_) => "job_failed",
            JobError::Timeout(_) => "timeout",
            JobError::EmptyOutput => "empty_output",
            JobError::Fetch(_) => "fetch",
            JobError::InvalidInput(_) => "invalid_input",
            JobError::Http(_) => "http",
        }
    }
}
