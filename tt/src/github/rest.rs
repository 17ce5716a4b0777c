//! GitHub REST v3 client

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::{CreatedIssue, CreatedLabel, GitHubError, IssueTracker, RepositoryInfo};
use crate::config::ResolvedGitHubConfig;
use crate::domain::RepoCoordinate;
use crate::planning::{IssueRequest, LabelRequest};

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("todotracker/", env!("CARGO_PKG_VERSION"));

/// Seconds to wait when a rate limit response names no reset time
const DEFAULT_RATE_LIMIT_SECS: u64 = 60;

/// GitHub REST API client
pub struct GitHubClient {
    token: String,
    base_url: Url,
    http: Client,
    timeout: Duration,
}

impl GitHubClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedGitHubConfig) -> Result<Self, GitHubError> {
        debug!(base_url = %config.base_url, "from_config: called");
        let base_url = Url::parse(&config.base_url).map_err(|e| GitHubError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(GitHubError::InvalidUrl(config.base_url.clone()));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(GitHubError::Network)?;

        Ok(Self {
            token: config.token.clone(),
            base_url,
            http,
            timeout: config.timeout,
        })
    }

    /// Build an endpoint URL; every segment is percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GitHubError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn repo_endpoint(&self, repo: &RepoCoordinate, rest: &[&str]) -> Result<Url, GitHubError> {
        let mut segments = vec!["repos", repo.owner.as_str(), repo.name.as_str()];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, GitHubError> {
        self.authorized(builder).send().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, e: reqwest::Error) -> GitHubError {
        if e.is_timeout() {
            GitHubError::Timeout(self.timeout)
        } else {
            GitHubError::Network(e)
        }
    }

    async fn json<T: DeserializeOwned>(&self, response: Response) -> Result<T, GitHubError> {
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&text).map_err(|e| GitHubError::InvalidResponse(e.to_string()))
    }

    async fn get_label(&self, repo: &RepoCoordinate, name: &str) -> Result<CreatedLabel, GitHubError> {
        debug!(%repo, %name, "get_label: called");
        let url = self.repo_endpoint(repo, &["labels", name])?;
        let response = self.send(self.http.get(url)).await?;
        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }
        let label: LabelBody = self.json(response).await?;
        Ok(CreatedLabel {
            name: label.name,
            color: label.color,
            existing: true,
        })
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn repository(&self, repo: &RepoCoordinate) -> Result<RepositoryInfo, GitHubError> {
        debug!(%repo, "repository: called");
        let url = self.repo_endpoint(repo, &[])?;
        let response = self.send(self.http.get(url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%repo, "repository: not found");
            return Err(GitHubError::RepositoryNotFound(repo.to_string()));
        }
        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }
        self.json(response).await
    }

    async fn create_label(&self, repo: &RepoCoordinate, label: &LabelRequest) -> Result<CreatedLabel, GitHubError> {
        debug!(%repo, name = %label.name, "create_label: called");
        let url = self.repo_endpoint(repo, &["labels"])?;
        let body = serde_json::json!({
            "name": label.name,
            "color": label.color.trim_start_matches('#'),
            "description": label.description,
        });
        let response = self.send(self.http.post(url).json(&body)).await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let err = error_for_status(response).await;
            if let GitHubError::ApiError { message, .. } = &err
                && message.contains("already_exists")
            {
                debug!(name = %label.name, "create_label: already exists, fetching");
                return self.get_label(repo, &label.name).await;
            }
            return Err(err);
        }
        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }

        let created: LabelBody = self.json(response).await?;
        debug!(name = %created.name, "create_label: success");
        Ok(CreatedLabel {
            name: created.name,
            color: created.color,
            existing: false,
        })
    }

    async fn create_issue(&self, repo: &RepoCoordinate, issue: &IssueRequest) -> Result<CreatedIssue, GitHubError> {
        debug!(%repo, title = %issue.title, "create_issue: called");
        let url = self.repo_endpoint(repo, &["issues"])?;
        let response = self.send(self.http.post(url).json(issue)).await?;
        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }
        let created: CreatedIssue = self.json(response).await?;
        debug!(number = created.number, "create_issue: success");
        Ok(created)
    }
}

/// Map a non-success response to the matching error
async fn error_for_status(response: Response) -> GitHubError {
    let status = response.status().as_u16();
    if let Some(retry_after) = rate_limit_delay(status, response.headers(), SystemTime::now()) {
        debug!(status, ?retry_after, "error_for_status: rate limited");
        return GitHubError::RateLimited { retry_after };
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.describe(),
        Err(_) => text,
    };
    debug!(status, %message, "error_for_status: API error");
    GitHubError::ApiError { status, message }
}

/// Delay before retrying if the response is a rate limit, `None` otherwise
///
/// Primary limits come as 403/429 with `x-ratelimit-remaining: 0` and a reset
/// epoch; secondary limits carry `retry-after`.
fn rate_limit_delay(status: u16, headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);

    let exhausted = header("x-ratelimit-remaining") == Some("0");
    let retry_after = header("retry-after").and_then(|s| s.parse::<u64>().ok());
    let is_limited = status == 429 || (status == 403 && (exhausted || retry_after.is_some()));
    if !is_limited {
        return None;
    }

    if let Some(secs) = retry_after {
        return Some(Duration::from_secs(secs));
    }
    let now_secs = now.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default();
    let delay = header("x-ratelimit-reset")
        .and_then(|s| s.parse::<u64>().ok())
        .map(|reset| reset.saturating_sub(now_secs))
        .unwrap_or(DEFAULT_RATE_LIMIT_SECS);
    Some(Duration::from_secs(delay))
}

#[derive(Debug, Deserialize)]
struct LabelBody {
    name: String,
    color: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    field: Option<String>,
}

impl ErrorBody {
    fn describe(&self) -> String {
        let details: Vec<String> = self
            .errors
            .iter()
            .map(|d| match (&d.field, &d.code) {
                (Some(field), Some(code)) => format!("{field} {code}"),
                (None, Some(code)) => code.clone(),
                (Some(field), None) => field.clone(),
                (None, None) => String::new(),
            })
            .filter(|s| !s.is_empty())
            .collect();
        if details.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, details.join(", "))
        }
    }
}
