//! Validation of untrusted AI output
//!
//! [`extract_json`] turns completion text into one JSON object; [`validate`]
//! checks it against the plan schema and produces a typed [`PlanDraft`].

mod draft;
mod error;
mod extract;
mod schema;

pub use draft::{LabelDraft, PhaseDraft, PlanDraft, TaskDraft};
pub use error::{ValidationError, Violation};
pub use extract::{extract_json, strip_framing};
pub use schema::{MAX_LABEL_NAME_CHARS, MAX_PHASE_NAME_CHARS, REQUIRED_KEYS, validate};

/// Extract and validate in one step
pub fn parse_response(text: &str) -> Result<PlanDraft, ValidationError> {
    let value = extract_json(text)?;
    validate(&value)
}
