//! Issue-tracker collaborator
//!
//! [`IssueTracker`] is the seam the orchestrator talks to; [`GitHubClient`]
//! implements it over the GitHub REST API.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod rest;
mod types;

pub use client::IssueTracker;
pub use error::GitHubError;
pub use rest::GitHubClient;
pub use types::{CreatedIssue, CreatedLabel, RepositoryInfo};

use crate::config::ResolvedGitHubConfig;

/// Create the tracker client for a resolved configuration
pub fn create_tracker(config: &ResolvedGitHubConfig) -> Result<Arc<dyn IssueTracker>, GitHubError> {
    debug!(base_url = %config.base_url, "create_tracker: called");
    Ok(Arc::new(GitHubClient::from_config(config)?))
}
