//! Completion service errors

use std::time::Duration;
use thiserror::Error;

use crate::retry::ErrorClass;

/// Seconds to wait when a 429 carries no usable Retry-After
pub const DEFAULT_RATE_LIMIT_SECS: u64 = 60;

/// Errors that can occur while requesting a completion
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Error object returned inside an otherwise successful response
    #[error("provider error{}: {message}", code.map(|c| format!(" {c}")).unwrap_or_default())]
    Provider { code: Option<i64>, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout after {0:?}")]
    Timeout(Duration),
}

impl LlmError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status == 408 || *status >= 500,
            LlmError::Network(_) => true,
            LlmError::Timeout(_) => true,
            LlmError::Provider { .. } | LlmError::InvalidResponse(_) => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(
            LlmError::RateLimited {
                retry_after: Duration::from_secs(60)
            }
            .is_retryable()
        );

        for status in [408, 500, 502, 503] {
            assert!(
                LlmError::ApiError {
                    status,
                    message: String::new()
                }
                .is_retryable()
            );
        }

        for status in [400, 401, 403, 404] {
            assert!(
                !LlmError::ApiError {
                    status,
                    message: String::new()
                }
                .is_retryable()
            );
        }

        assert!(LlmError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!LlmError::InvalidResponse("no choices".to_string()).is_retryable());
    }

    #[test]
    fn test_provider_error_not_retried() {
        let upstream = LlmError::Provider {
            code: Some(502),
            message: "upstream unavailable".to_string(),
        };
        assert!(!upstream.is_retryable());

        let bad_model = LlmError::Provider {
            code: Some(400),
            message: "model not found".to_string(),
        };
        assert!(!bad_model.is_retryable());
        assert_eq!(bad_model.to_string(), "provider error 400: model not found");

        let no_code = LlmError::Provider {
            code: None,
            message: "boom".to_string(),
        };
        assert_eq!(no_code.to_string(), "provider error: boom");
    }

    #[test]
    fn test_class_carries_retry_after() {
        let err = LlmError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert_eq!(
            err.class(),
            ErrorClass::Transient {
                retry_after: Some(Duration::from_secs(42))
            }
        );

        let err = LlmError::ApiError {
            status: 401,
            message: "bad key".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::Fatal);
    }
}
