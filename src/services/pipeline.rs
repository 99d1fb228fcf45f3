//! Multi-stage generation where later stages are optional refinements.
//!
//! A later stage may fail without failing the request: the last good
//! artifact is returned instead, flagged as unrefined.

use serde_json::json;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use crate::models::artifact::Artifact;
use crate::models::generation::Gender;
use crate::services::job_client::{AsyncJobClient, JobError, JobInput};
use crate::services::prompt;

/// Result of a stage that was allowed to fail.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub artifact: Artifact,
    /// Whether the refinement stage's output was used.
    pub refined: bool,
}

/// Keep `refined` if it succeeded, else fall back to `previous`.
pub fn refine_or_keep(
    previous: Artifact,
    refined: Result<Artifact, JobError>,
    stage: &'static str,
) -> StageOutcome {
    match refined {
        Ok(artifact) => StageOutcome {
            artifact,
            refined: true,
        },
        Err(e) => {
            metrics::counter!("pipeline_fallbacks_total", "stage" => stage).increment(1);
            tracing::warn!(stage, error = %e, kind = e.kind(), "Stage failed, keeping previous artifact");
            StageOutcome {
                artifact: previous,
                refined: false,
            }
        }
    }
}

/// Hair overlay image, transparent when background removal succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct HairPng {
    pub artifact: Artifact,
    pub has_transparency: bool,
}

/// Two-stage pipeline: render the hairstyle, then cut out the background.
///
/// Both stages share one deadline. Background removal only gets what the
/// render left over, and is skipped when nothing is left.
pub struct HairPngPipeline {
    jobs: AsyncJobClient,
    render_model: String,
    matting_model: String,
    budget: Duration,
}

impl HairPngPipeline {
    pub fn new(
        jobs: AsyncJobClient,
        render_model: impl Into<String>,
        matting_model: impl Into<String>,
    ) -> Self {
        let budget = jobs.poll_config().max_wait;
        Self {
            jobs,
            render_model: render_model.into(),
            matting_model: matting_model.into(),
            budget,
        }
    }

    /// Bound the whole pipeline, both stages included.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub async fn render(&self, style_prompt: &str, gender: Gender) -> Result<HairPng, JobError> {
        let render = JobInput::new(
            &self.render_model,
            json!({
                "prompt": prompt::hair_png_prompt(style_prompt, gender),
                "aspect_ratio": "1:1",
                "output_format": "png",
                "num_outputs": 1
            }),
        );
        let deadline = Instant::now() + self.budget;
        let base = self.jobs.run_job_within(&render, self.budget).await?;

        // Keep one poll interval spare so a late status read still lands
        // before the deadline.
        let remaining = deadline
            .saturating_duration_since(Instant::now())
            .saturating_sub(self.jobs.poll_config().interval);
        let matted = if remaining.is_zero() {
            tracing::info!(budget_secs = self.budget.as_secs(), "No time left for background removal");
            Err(JobError::Timeout(self.budget))
        } else {
            let matting = JobInput::new(
                &self.matting_model,
                json!({ "image": base.to_data_uri(), "format": "png" }),
            );
            timeout_at(deadline, self.jobs.run_job_within(&matting, remaining))
                .await
                .unwrap_or(Err(JobError::Timeout(self.budget)))
        };

        let outcome = refine_or_keep(base, matted, "background_removal");
        // A cut-out that decodes without an alpha channel is not transparent.
        let has_transparency = outcome.refined && outcome.artifact.has_alpha().unwrap_or(true);

        Ok(HairPng {
            artifact: outcome.artifact,
            has_transparency,
        })
    }
}
