//! Orchestrator - drives one run from description to created issues
//!
//! ```text
//! Idle → PromptBuilt → AiResponseReceived → Validated → Normalized
//!      → LabelsCreated → IssuesCreated → Summarized
//! ```
//!
//! Any fatal error ends the run with a [`RunFailure`] naming the stage it was
//! trying to reach. Failures of individual labels or issues are recorded and
//! the run carries on.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{CreationResult, ResourceKind, RunError, RunFailure, RunStage, RunSummary};
use crate::config::ResolvedConfig;
use crate::domain::RepoCoordinate;
use crate::github::{GitHubError, IssueTracker};
use crate::llm::{LlmClient, LlmError, StopReason, TokenUsage};
use crate::planning::{NormalizedPlan, PlanNormalizer, ResourcePlan, map_plan};
use crate::prompts::{PromptContext, PromptLoader};
use crate::retry::RetryPolicy;
use crate::validation::parse_response;

/// Everything known once the AI's plan has been accepted
#[derive(Debug, Clone)]
pub struct PlannedRun {
    pub normalized: NormalizedPlan,
    pub resources: ResourcePlan,
    pub model: String,
    pub usage: TokenUsage,
}

/// Runs the pipeline against injected collaborators
pub struct Orchestrator {
    config: ResolvedConfig,
    llm: Arc<dyn LlmClient>,
    tracker: Arc<dyn IssueTracker>,
    prompts: PromptLoader,
    retry: RetryPolicy,
    stage: RunStage,
}

impl Orchestrator {
    pub fn new(
        config: ResolvedConfig,
        llm: Arc<dyn LlmClient>,
        tracker: Arc<dyn IssueTracker>,
        prompts: PromptLoader,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);
        Self {
            config,
            llm,
            tracker,
            prompts,
            retry,
            stage: RunStage::Idle,
        }
    }

    /// Current stage; after a failure, the last stage reached
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    fn advance(&mut self, to: RunStage) {
        debug_assert_eq!(self.stage.next(), Some(to), "stages advance one at a time");
        info!(from = %self.stage, %to, "Run stage reached");
        self.stage = to;
    }

    fn fail(&self, error: impl Into<RunError>) -> RunFailure {
        let stage = self.stage.next().unwrap_or(RunStage::Summarized);
        let failure = RunFailure::new(stage, error);
        warn!(%stage, error = %failure.error, "Run failed");
        failure
    }

    /// Ask the AI for a plan and accept it, without touching the tracker
    pub async fn plan(&mut self, description: &str) -> Result<PlannedRun, RunFailure> {
        debug!(description_chars = description.len(), "plan: called");

        let context = PromptContext::new(description, self.config.limits.max_tasks);
        let request = self
            .prompts
            .plan_request(&context, &self.config.llm)
            .map_err(|e| self.fail(e))?;
        self.advance(RunStage::PromptBuilt);

        let llm = Arc::clone(&self.llm);
        let response = self
            .retry
            .run("AI completion", || llm.complete(request.clone()), LlmError::class)
            .await
            .map_err(|e| self.fail(e))?;
        if response.stop_reason == StopReason::MaxTokens {
            warn!(model = %response.model, "AI response hit the token limit and may be truncated");
        }
        let text = response
            .content
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| self.fail(RunError::EmptyResponse))?;
        self.advance(RunStage::AiResponseReceived);

        let draft = parse_response(&text).map_err(|e| self.fail(e))?;
        self.advance(RunStage::Validated);

        let normalizer = PlanNormalizer::new(self.config.limits.max_tasks_per_phase);
        let normalized = normalizer.normalize(&draft).map_err(|e| self.fail(e))?;
        for overflow in &normalized.warnings {
            warn!(%overflow, "Phase over the task limit");
        }
        self.advance(RunStage::Normalized);

        let resources = map_plan(&normalized.plan);
        info!(
            project = %normalized.plan.project_name(),
            labels = resources.labels.len(),
            issues = resources.issues.len(),
            "Plan accepted"
        );

        Ok(PlannedRun {
            normalized,
            resources,
            model: response.model,
            usage: response.usage,
        })
    }

    /// Full run: plan, then create labels and issues in `repo`
    pub async fn run(&mut self, repo: &RepoCoordinate, description: &str) -> Result<RunSummary, RunFailure> {
        debug!(%repo, "run: called");
        let planned = self.plan(description).await?;

        let tracker = Arc::clone(&self.tracker);
        let info = self
            .retry
            .run("repository lookup", || tracker.repository(repo), GitHubError::class)
            .await
            .map_err(|e| self.fail(e))?;
        debug!(full_name = %info.full_name, "run: repository confirmed");

        let mut results = Vec::with_capacity(planned.resources.len());

        for label in &planned.resources.labels {
            let outcome = self
                .retry
                .run("create label", || tracker.create_label(repo, label), GitHubError::class)
                .await;
            let result = match outcome {
                Ok(created) if created.existing => {
                    CreationResult::success(ResourceKind::Label, &label.name, created.name).existing()
                }
                Ok(created) => CreationResult::success(ResourceKind::Label, &label.name, created.name),
                Err(e) => {
                    warn!(name = %label.name, error = %e, "Label creation failed");
                    CreationResult::failure(ResourceKind::Label, &label.name, e.to_string())
                }
            };
            results.push(result);
        }
        self.advance(RunStage::LabelsCreated);

        for issue in &planned.resources.issues {
            let outcome = self
                .retry
                .run("create issue", || tracker.create_issue(repo, issue), GitHubError::class)
                .await;
            let result = match outcome {
                Ok(created) => {
                    debug!(number = created.number, title = %issue.title, "run: issue created");
                    CreationResult::success(ResourceKind::Issue, &issue.title, created.html_url)
                }
                Err(e) => {
                    warn!(title = %issue.title, error = %e, "Issue creation failed");
                    CreationResult::failure(ResourceKind::Issue, &issue.title, e.to_string())
                }
            };
            results.push(result);
        }
        self.advance(RunStage::IssuesCreated);

        let summary = RunSummary::new(
            &planned.normalized.plan,
            repo.clone(),
            results,
            planned.normalized.warnings,
        );
        self.advance(RunStage::Summarized);
        info!(
            tasks_created = summary.tasks_created,
            labels_created = summary.labels_created,
            failures = summary.failures.len(),
            "Run complete"
        );
        Ok(summary)
    }
}
