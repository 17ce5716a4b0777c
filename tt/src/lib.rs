//! todotracker - bootstrap a GitHub issue tracker from a project description
//!
//! A free-text description goes to an AI completion service, the JSON plan it
//! returns is validated and normalized, and the result becomes GitHub labels
//! and phase-ordered issues.
//!
//! # Core Concepts
//!
//! - **Untrusted AI output**: every field is validated before anything is created
//! - **Closed vocabularies**: priority, effort and type are enums past validation
//! - **Partial success**: one failed issue does not abort the rest
//! - **Explicit configuration**: the environment is read once, in [`Config::resolve`]
//!
//! # Modules
//!
//! - [`domain`] - Plan, phase, task and label types
//! - [`validation`] - Response extraction and schema validation
//! - [`planning`] - Normalization and mapping to creation requests
//! - [`prompts`] - Prompt templates
//! - [`llm`] - Completion client trait and OpenRouter implementation
//! - [`github`] - Issue tracker trait and GitHub REST implementation
//! - [`retry`] - Retry policy shared by both external services
//! - [`orchestrator`] - The run state machine
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`display`] - Console output

pub mod cli;
pub mod config;
pub mod display;
pub mod domain;
pub mod github;
pub mod llm;
pub mod orchestrator;
pub mod planning;
pub mod prompts;
pub mod retry;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, ConfigError, Overrides, ResolvedConfig};
pub use domain::{Effort, Label, Phase, Priority, ProjectPlan, RepoCoordinate, Task, TaskType};
pub use github::{GitHubClient, GitHubError, IssueTracker};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenRouterClient};
pub use orchestrator::{CreationResult, Orchestrator, PlannedRun, RunError, RunFailure, RunStage, RunSummary};
pub use planning::{NormalizedPlan, PlanNormalizer, ResourcePlan, map_plan};
pub use retry::RetryPolicy;
pub use validation::{PlanDraft, ValidationError, parse_response};
