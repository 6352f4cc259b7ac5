use postpilot_core::ValidationError;
use postpilot_db::DbError;
use postpilot_linkedin::LinkedinError;
use postpilot_llm::LlmError;
use postpilot_news::NewsError;
use thiserror::Error;

/// Errors surfaced at a stage boundary.
///
/// Validation failures happen before any side effect; the remaining
/// variants wrap a collaborator's failure. The orchestrator records the
/// message on the activity log and stops the run without rolling back
/// work committed by earlier stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Every configured source failed during collect; nothing to work with.
    #[error("all news sources failed")]
    AllSourcesFailed,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    News(#[from] NewsError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Publish(#[from] LinkedinError),
}
