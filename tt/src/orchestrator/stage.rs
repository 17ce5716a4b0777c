//! Run stages and fatal run errors

use thiserror::Error;

use crate::github::GitHubError;
use crate::llm::LlmError;
use crate::planning::NormalizationError;
use crate::prompts::PromptError;
use crate::retry::RetryError;
use crate::validation::ValidationError;

/// Where a run is in its linear lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunStage {
    Idle,
    PromptBuilt,
    AiResponseReceived,
    Validated,
    Normalized,
    LabelsCreated,
    IssuesCreated,
    Summarized,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Idle => "idle",
            RunStage::PromptBuilt => "prompt-built",
            RunStage::AiResponseReceived => "ai-response-received",
            RunStage::Validated => "validated",
            RunStage::Normalized => "normalized",
            RunStage::LabelsCreated => "labels-created",
            RunStage::IssuesCreated => "issues-created",
            RunStage::Summarized => "summarized",
        }
    }

    /// The only stage this one may move to
    pub fn next(&self) -> Option<RunStage> {
        match self {
            RunStage::Idle => Some(RunStage::PromptBuilt),
            RunStage::PromptBuilt => Some(RunStage::AiResponseReceived),
            RunStage::AiResponseReceived => Some(RunStage::Validated),
            RunStage::Validated => Some(RunStage::Normalized),
            RunStage::Normalized => Some(RunStage::LabelsCreated),
            RunStage::LabelsCreated => Some(RunStage::IssuesCreated),
            RunStage::IssuesCreated => Some(RunStage::Summarized),
            RunStage::Summarized => None,
        }
    }

    /// A fatal failure while reaching this stage may leave resources on the tracker
    ///
    /// The only fatal error at `LabelsCreated` is the repository check, which
    /// runs before the first label is created.
    pub fn touches_tracker(&self) -> bool {
        *self > RunStage::LabelsCreated
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal errors; any of these ends the run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Completion(#[from] RetryError<LlmError>),

    #[error("AI response contained no text")]
    EmptyResponse,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Repository(#[from] RetryError<GitHubError>),
}

/// A run that ended in the terminal failed state
#[derive(Debug, Error)]
#[error("run failed while reaching stage {stage}: {error}")]
pub struct RunFailure {
    /// Stage the run was trying to reach
    pub stage: RunStage,
    #[source]
    pub error: RunError,
}

impl RunFailure {
    pub fn new(stage: RunStage, error: impl Into<RunError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}
