//! Typed but unnormalized plan, exactly as the AI described it

use crate::domain::{Effort, Priority, TaskType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDraft {
    pub name: String,
    pub description: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub phase: String,
    pub priority: Priority,
    pub effort: Effort,
    pub task_type: TaskType,
    pub labels: Vec<String>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDraft {
    pub name: String,
    pub color: String,
    pub description: String,
}

/// Output of schema validation, input of the normalizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDraft {
    pub project_name: String,
    pub project_summary: String,
    pub phases: Vec<PhaseDraft>,
    pub tasks: Vec<TaskDraft>,
    pub labels: Vec<LabelDraft>,
}
