//! Embedded fallback prompts
//!
//! Compiled into the binary from .pmt files and used when no override file is found.

use tracing::debug;

/// System message for plan extraction
pub const PLAN_SYSTEM: &str = include_str!("../../prompts/plan-system.pmt");

/// User message for plan extraction
pub const PLAN_EXTRACT: &str = include_str!("../../prompts/plan-extract.pmt");

/// Look up an embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "plan-system" => {
            debug!("get_embedded: matched plan-system");
            Some(PLAN_SYSTEM)
        }
        "plan-extract" => {
            debug!("get_embedded: matched plan-extract");
            Some(PLAN_EXTRACT)
        }
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
