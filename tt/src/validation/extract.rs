//! Pull the JSON document out of raw completion text
//!
//! Only framing is removed: reasoning blocks and one surrounding code fence.
//! Whatever remains must be exactly one JSON object.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::error::ValidationError;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>|◁think▷.*?◁/think▷").expect("valid think regex"));

/// Remove reasoning blocks and a surrounding Markdown code fence
pub fn strip_framing(text: &str) -> String {
    let without_thinking = THINK_BLOCK.replace_all(text, "");
    let trimmed = without_thinking.trim();

    if let Some(rest) = trimmed.strip_prefix("```")
        && let Some(body) = rest.strip_suffix("```")
    {
        // Drop the info string (`json`) on the opening fence line
        let body = match body.split_once('\n') {
            Some((info, body)) if !info.trim_start().starts_with('{') => body,
            _ => body,
        };
        return body.trim().to_string();
    }

    trimmed.to_string()
}

/// Parse the completion text into a single JSON object
pub fn extract_json(text: &str) -> Result<Value, ValidationError> {
    debug!(text_len = text.len(), "extract_json: called");
    let body = strip_framing(text);
    let mut stream = serde_json::Deserializer::from_str(&body).into_iter::<Value>();

    let value = match stream.next() {
        None => return Err(ValidationError::single("$", "response contains no JSON")),
        Some(Err(e)) => return Err(ValidationError::single("$", format!("response is not valid JSON: {}", e))),
        Some(Ok(value)) => value,
    };

    match stream.next() {
        None => {}
        Some(Ok(_)) => return Err(ValidationError::single("$", "response contains more than one JSON value")),
        Some(Err(e)) => {
            return Err(ValidationError::single(
                "$",
                format!("unexpected content after the JSON object: {}", e),
            ));
        }
    }

    if !value.is_object() {
        return Err(ValidationError::single("$", "response JSON is not an object"));
    }

    debug!("extract_json: parsed one object");
    Ok(value)
}
