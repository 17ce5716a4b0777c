//! Planning module - from validated draft to tracker requests
//!
//! ```text
//! PlanDraft → PlanNormalizer → ProjectPlan → map_plan → ResourcePlan
//! ```
//!
//! The normalizer owns every rule that can reject or trim the AI's plan. The
//! mapper is a pure function that fixes creation order and issue content.

mod mapper;
mod normalizer;

pub use mapper::{
    CreationRequest, ISSUE_FOOTER, IssueRequest, LabelRequest, ResourcePlan, derived_labels, map_plan, render_body,
};
pub use normalizer::{
    DEFAULT_MAX_TASKS_PER_PHASE, NormalizationError, NormalizedPlan, PhaseOverflow, PlanNormalizer, UnresolvedPhase,
};
