//! Orchestrator - the run state machine and its results

mod engine;
mod stage;
mod summary;

pub use engine::{Orchestrator, PlannedRun};
pub use stage::{RunError, RunFailure, RunStage};
pub use summary::{CreationResult, FailureRecord, ResourceKind, RunSummary};
