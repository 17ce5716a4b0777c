//! Prompt templates for plan extraction
//!
//! Handlebars templates with embedded fallbacks; a project can override them
//! with `.todotracker/prompts/{name}.pmt`.

mod embedded;
mod loader;

pub use loader::{EXTRACT_TEMPLATE, PromptContext, PromptError, PromptLoader, SYSTEM_TEMPLATE};
