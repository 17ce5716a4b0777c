//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults, and
//! assembles the completion request for plan extraction.

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::embedded;
use crate::config::ResolvedLlmConfig;
use crate::llm::{CompletionRequest, Message};

/// Template for the system message
pub const SYSTEM_TEMPLATE: &str = "plan-system";

/// Template for the user message carrying the description
pub const EXTRACT_TEMPLATE: &str = "plan-extract";

/// Errors while loading or rendering a template
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt template not found: {0}")]
    NotFound(String),

    #[error("failed to read prompt {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render template {name}: {message}")]
    Render { name: String, message: String },
}

/// Values available to the extraction templates
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    /// Free-text project description
    pub description: String,
    /// Task count the AI is asked to stay within
    pub max_tasks: u32,
}

impl PromptContext {
    pub fn new(description: impl Into<String>, max_tasks: u32) -> Self {
        Self {
            description: description.into(),
            max_tasks,
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.todotracker/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at `dir`, which may hold `.todotracker/prompts/`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let user_dir = dir.as_ref().join(".todotracker/prompts");
        Self {
            hbs: Self::engine(),
            user_dir: if user_dir.exists() { Some(user_dir) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    // Prompts are plain text, not HTML
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.todotracker/prompts/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String, PromptError> {
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!("Loading prompt from user override: {:?}", path);
                return std::fs::read_to_string(&path).map_err(|source| PromptError::Read { path, source });
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded prompt: {}", name);
            return Ok(content.to_string());
        }

        Err(PromptError::NotFound(name.to_string()))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String, PromptError> {
        let template = self.load_template(template_name)?;
        debug!(template_name, max_tasks = context.max_tasks, "render: called");

        self.hbs
            .render_template(&template, context)
            .map_err(|e| PromptError::Render {
                name: template_name.to_string(),
                message: e.to_string(),
            })
    }

    /// Build the plan-extraction completion request
    pub fn plan_request(
        &self,
        context: &PromptContext,
        llm: &ResolvedLlmConfig,
    ) -> Result<CompletionRequest, PromptError> {
        let system_prompt = self.render(SYSTEM_TEMPLATE, context)?;
        let user_prompt = self.render(EXTRACT_TEMPLATE, context)?;
        info!(
            model = %llm.model,
            prompt_chars = user_prompt.len(),
            "Built plan extraction prompt"
        );

        Ok(CompletionRequest {
            model: llm.model.clone(),
            system_prompt,
            messages: vec![Message::user(user_prompt)],
            temperature: llm.temperature,
            max_tokens: Some(llm.max_tokens),
        })
    }
}
