//! Project plan domain types
//!
//! A [`ProjectPlan`] is built once per run by the normalizer and is read-only
//! afterwards: its fields are private and only shared references are handed out.

use serde::Serialize;

use super::priority::{Effort, Priority, TaskType};

/// Color given to labels that tasks reference but the plan never declared
pub const DEFAULT_LABEL_COLOR: &str = "808080";

/// Description given to labels that tasks reference but the plan never declared
pub const DEFAULT_LABEL_DESCRIPTION: &str = "Auto-generated label";

/// GitHub rejects label descriptions longer than this
pub const MAX_LABEL_DESCRIPTION_CHARS: usize = 100;

/// A stage of the project; tasks are grouped and sequenced by phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phase {
    pub name: String,
    pub description: String,
    /// Ascending display and creation order; ties are allowed
    pub order: u32,
}

/// A single unit of work that becomes one issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub title: String,
    pub description: String,
    /// Name of a phase declared in the same plan
    pub phase: String,
    pub priority: Priority,
    pub effort: Effort,
    pub labels: Vec<String>,
    /// Titles of other tasks, documentation only
    pub dependencies: Vec<String>,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Index of the task in the AI response
    #[serde(skip)]
    pub position: usize,
}

/// A tracker label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub name: String,
    /// Six hex digits, no leading '#'
    pub color: String,
    pub description: String,
}

impl Label {
    /// Descriptions past the tracker limit are cut at a character boundary
    pub fn new(name: impl Into<String>, color: impl Into<String>, description: impl Into<String>) -> Self {
        let mut description = description.into();
        if let Some((cut, _)) = description.char_indices().nth(MAX_LABEL_DESCRIPTION_CHARS) {
            description.truncate(cut);
        }
        Self {
            name: name.into(),
            color: color.into(),
            description,
        }
    }

    /// Label synthesized for a name that tasks use but the plan did not declare
    pub fn synthesized(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_LABEL_COLOR, DEFAULT_LABEL_DESCRIPTION)
    }

    /// Key used for case-insensitive identity
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// The normalized plan for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPlan {
    project_name: String,
    project_summary: String,
    phases: Vec<Phase>,
    tasks: Vec<Task>,
    labels: Vec<Label>,
}

impl ProjectPlan {
    pub(crate) fn new(
        project_name: String,
        project_summary: String,
        phases: Vec<Phase>,
        tasks: Vec<Task>,
        labels: Vec<Label>,
    ) -> Self {
        Self {
            project_name,
            project_summary,
            phases,
            tasks,
            labels,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn project_summary(&self) -> &str {
        &self.project_summary
    }

    /// Phases sorted by `order`, ties kept in declaration order
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Tasks in original response order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Deduplicated labels in declaration order, synthesized labels last
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name == name)
    }

    pub fn tasks_in_phase<'a>(&'a self, phase: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |t| t.phase == phase)
    }
}
