//! Issue tracker errors

use std::time::Duration;
use thiserror::Error;

use crate::retry::ErrorClass;

/// Errors that can occur while talking to the issue tracker
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("repository {0} not found or not accessible with this token")]
    RepositoryNotFound(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("GitHub API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl GitHubError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            GitHubError::RateLimited { .. } => true,
            GitHubError::ApiError { status, .. } => *status == 408 || *status >= 500,
            GitHubError::Network(_) | GitHubError::Timeout(_) => true,
            GitHubError::RepositoryNotFound(_) | GitHubError::InvalidResponse(_) | GitHubError::InvalidUrl(_) => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GitHubError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Classification for the retry policy
    pub fn class(&self) -> ErrorClass {
        if self.is_retryable() {
            ErrorClass::Transient {
                retry_after: self.retry_after(),
            }
        } else {
            ErrorClass::Fatal
        }
    }
}
