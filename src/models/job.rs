use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Status of a provider-side generation job, as observed by polling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum JobStatus {
    #[strum(to_string = "queued", serialize = "starting")]
    Queued,
    #[strum(to_string = "running", serialize = "processing")]
    Running,
    Succeeded,
    Failed,
    #[strum(to_string = "canceled", serialize = "cancelled")]
    Canceled,
}

impl JobStatus {
    /// Map a provider status string. Unrecognised values are still in flight.
    pub fn from_provider(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(JobStatus::Running)
    }
}

/// A generation job tracked by its provider-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Asset references (URL or `data:` URI). Only kept once succeeded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<String>,
    /// Only kept for failed or canceled jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Build a job snapshot, dropping fields that the status does not allow.
    pub fn observed(
        id: impl Into<String>,
        status: JobStatus,
        output: Vec<String>,
        error: Option<String>,
    ) -> Self {
        let output = if status == JobStatus::Succeeded {
            output
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect()
        } else {
            Vec::new()
        };
        let error = match status {
            JobStatus::Failed | JobStatus::Canceled => error.filter(|e| !e.trim().is_empty()),
            _ => None,
        };

        Self {
            id: id.into(),
            status,
            output,
            error,
        }
    }

    /// First asset reference, if any.
    pub fn first_output(&self) -> Option<&str> {
        self.output.first().map(String::as_str)
    }
}

/// Flatten a provider `output` field into asset references.
///
/// Providers return either a single reference or a list of them.
pub fn output_references(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Render a provider error field as text.
pub fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
