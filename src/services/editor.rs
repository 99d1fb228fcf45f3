use async_trait::async_trait;

use crate::models::artifact::Artifact;
use crate::models::generation::GenerationSettings;
use crate::services::job_client::JobError;

/// A photo plus the instruction describing how to change it.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub source: Artifact,
    pub instruction: String,
    pub settings: GenerationSettings,
}

/// A provider that turns a source photo and an instruction into a new image.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn edit(&self, request: &EditRequest) -> Result<Artifact, JobError>;
}
