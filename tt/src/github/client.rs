//! IssueTracker trait definition

use async_trait::async_trait;

use super::{CreatedIssue, CreatedLabel, GitHubError, RepositoryInfo};
use crate::domain::RepoCoordinate;
use crate::planning::{IssueRequest, LabelRequest};

/// Issue tracker collaborator, scoped per call to a repository
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Confirm the repository exists and is accessible
    async fn repository(&self, repo: &RepoCoordinate) -> Result<RepositoryInfo, GitHubError>;

    /// Create a label; an existing label with the same name counts as success
    async fn create_label(&self, repo: &RepoCoordinate, label: &LabelRequest) -> Result<CreatedLabel, GitHubError>;

    async fn create_issue(&self, repo: &RepoCoordinate, issue: &IssueRequest) -> Result<CreatedIssue, GitHubError>;
}
