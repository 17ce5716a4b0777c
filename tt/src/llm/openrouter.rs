//! OpenRouter client
//!
//! Speaks the OpenAI-compatible Chat Completions API that OpenRouter exposes.
//! Each call is a single attempt; retries belong to the caller's policy.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::DEFAULT_RATE_LIMIT_SECS;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::ResolvedLlmConfig;

/// Sent as `HTTP-Referer` for OpenRouter app attribution
const ATTRIBUTION_URL: &str = "https://github.com/todotracker/todotracker";

/// Sent as `X-Title` for OpenRouter app attribution
const ATTRIBUTION_TITLE: &str = "todotracker";

/// OpenRouter API client
pub struct OpenRouterClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenRouterClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedLlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let http = Client::builder().timeout(config.timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            http,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        })
    }

    /// Build the request body for the chat completions endpoint
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let model = if request.model.is_empty() {
            &self.model
        } else {
            &request.model
        };
        debug!(%model, "build_request_body: called");

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];
        messages.extend(request.messages.iter().map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        }));

        let max_tokens = request.max_tokens.map_or(self.max_tokens, |n| n.min(self.max_tokens));

        serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": max_tokens,
            "stream": false,
        })
    }

    /// Map a non-success status to the matching error
    async fn error_for_status(response: Response) -> LlmError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_SECS);
            debug!(retry_after, "error_for_status: rate limited (429)");
            return LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            };
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);
        debug!(status, "error_for_status: API error");
        LlmError::ApiError { status, message }
    }

    /// Parse a 200 body, which may still carry an error object
    fn parse_response(&self, body: &str) -> Result<CompletionResponse, LlmError> {
        let api_response: ChatResponse =
            serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse(format!("malformed body: {e}")))?;

        if let Some(error) = api_response.error {
            debug!(code = ?error.code, "parse_response: provider error in body");
            return Err(LlmError::Provider {
                code: error.code,
                message: error.message,
            });
        }

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;
        let stop_reason = StopReason::from_finish_reason(choice.finish_reason.as_deref());
        if stop_reason == StopReason::MaxTokens {
            warn!(max_tokens = self.max_tokens, "parse_response: completion stopped at the token limit");
        }

        let usage = api_response.usage.unwrap_or_default();
        Ok(CompletionResponse {
            content: choice.message.content,
            model: api_response.model.unwrap_or_else(|| self.model.clone()),
            stop_reason,
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.model, "complete: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .header("HTTP-Referer", ATTRIBUTION_URL)
            .header("X-Title", ATTRIBUTION_TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    debug!("complete: timed out");
                    LlmError::Timeout(self.timeout)
                } else {
                    debug!(error = %e, "complete: network error");
                    LlmError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout)
            } else {
                LlmError::Network(e)
            }
        })?;
        let parsed = self.parse_response(&text)?;
        debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "complete: success"
        );
        Ok(parsed)
    }
}

// Chat completions response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    model: Option<String>,
    usage: Option<ChatUsage>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    code: Option<i64>,
    #[serde(default)]
    message: String,
}
