//! Plan-to-resources mapping
//!
//! Pure and deterministic: the same plan always yields the same requests in
//! the same order. Labels come first, then issues grouped by phase order.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{DEFAULT_LABEL_COLOR, Label, ProjectPlan, Task};

/// Footer appended to every generated issue body
pub const ISSUE_FOOTER: &str = "*This issue was generated by todotracker from the project description.*";

/// A label the tracker should create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelRequest {
    pub name: String,
    pub color: String,
    pub description: String,
}

impl From<&Label> for LabelRequest {
    fn from(label: &Label) -> Self {
        Self {
            name: label.name.clone(),
            color: label.color.clone(),
            description: label.description.clone(),
        }
    }
}

/// An issue the tracker should create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRequest {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    /// Phase the task belongs to
    #[serde(skip)]
    pub phase: String,
    /// Original position of the task in the AI response
    #[serde(skip)]
    pub position: usize,
}

/// One creation call, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationRequest<'a> {
    Label(&'a LabelRequest),
    Issue(&'a IssueRequest),
}

/// Every creation request for one plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourcePlan {
    pub labels: Vec<LabelRequest>,
    pub issues: Vec<IssueRequest>,
}

impl ResourcePlan {
    /// All requests in the order they must be issued
    pub fn requests(&self) -> impl Iterator<Item = CreationRequest<'_>> {
        self.labels
            .iter()
            .map(CreationRequest::Label)
            .chain(self.issues.iter().map(CreationRequest::Issue))
    }

    pub fn len(&self) -> usize {
        self.labels.len() + self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Map a normalized plan to its ordered creation requests
pub fn map_plan(plan: &ProjectPlan) -> ResourcePlan {
    let mut tasks: Vec<&Task> = plan.tasks().iter().collect();
    tasks.sort_by_key(|t| (phase_order(plan, t), t.position));

    let issues: Vec<IssueRequest> = tasks.iter().map(|t| issue_request(t)).collect();

    let mut seen: HashSet<String> = plan.labels().iter().map(Label::key).collect();
    let mut labels: Vec<LabelRequest> = plan.labels().iter().map(LabelRequest::from).collect();

    // Derived labels the plan did not declare still need to exist on the tracker
    for task in &tasks {
        for derived in derived_labels(task) {
            if seen.insert(derived.name.to_lowercase()) {
                labels.push(derived);
            }
        }
    }

    ResourcePlan { labels, issues }
}

fn phase_order(plan: &ProjectPlan, task: &Task) -> u32 {
    plan.phase(&task.phase).map(|p| p.order).unwrap_or(u32::MAX)
}

/// `priority:*`, `type:*`, `phase:*` and `effort:*` labels for a task
pub fn derived_labels(task: &Task) -> [LabelRequest; 4] {
    [
        LabelRequest {
            name: format!("priority:{}", task.priority),
            color: task.priority.color().to_string(),
            description: format!("{} priority task", capitalize(task.priority.as_str())),
        },
        LabelRequest {
            name: format!("type:{}", task.task_type),
            color: DEFAULT_LABEL_COLOR.to_string(),
            description: format!("Task type: {}", task.task_type),
        },
        LabelRequest {
            name: format!("phase:{}", task.phase),
            color: DEFAULT_LABEL_COLOR.to_string(),
            description: format!("Phase: {}", task.phase),
        },
        LabelRequest {
            name: format!("effort:{}", task.effort),
            color: DEFAULT_LABEL_COLOR.to_string(),
            description: format!("Estimated effort: {}", task.effort),
        },
    ]
}

fn issue_request(task: &Task) -> IssueRequest {
    let mut seen = HashSet::new();
    let labels = derived_labels(task)
        .into_iter()
        .map(|l| l.name)
        .chain(task.labels.iter().cloned())
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect();

    IssueRequest {
        title: task.title.clone(),
        body: render_body(task),
        labels,
        phase: task.phase.clone(),
        position: task.position,
    }
}

/// Render the markdown body of an issue
pub fn render_body(task: &Task) -> String {
    let mut md = String::new();

    if !task.description.is_empty() {
        md.push_str(&task.description);
        md.push_str("\n\n");
    }

    md.push_str("## Task Details\n\n");
    md.push_str(&format!("- **Phase:** {}\n", task.phase));
    md.push_str(&format!("- **Priority:** {}\n", capitalize(task.priority.as_str())));
    md.push_str(&format!("- **Estimated Effort:** {}\n", task.effort));
    md.push_str(&format!("- **Type:** {}\n", capitalize(task.task_type.as_str())));

    // Dependencies are references only; the tracker has no dependency graph
    if !task.dependencies.is_empty() {
        md.push_str("\n## Dependencies\n\n");
        for dep in &task.dependencies {
            md.push_str(&format!("- [ ] {}\n", dep));
        }
    }

    md.push_str("\n---\n");
    md.push_str(ISSUE_FOOTER);
    md.push('\n');
    md
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
