//! AI completion collaborator
//!
//! [`LlmClient`] is the seam the orchestrator talks to; [`OpenRouterClient`]
//! is the production implementation.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openrouter;
mod types;

pub use client::LlmClient;
pub use error::{DEFAULT_RATE_LIMIT_SECS, LlmError};
pub use openrouter::OpenRouterClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::ResolvedLlmConfig;

/// Create the completion client for a resolved configuration
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(model = %config.model, "create_client: called");
    Ok(Arc::new(OpenRouterClient::from_config(config)?))
}
