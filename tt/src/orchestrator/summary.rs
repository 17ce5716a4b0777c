//! Per-resource outcomes and the run summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ProjectPlan, RepoCoordinate};
use crate::planning::PhaseOverflow;

/// Kind of tracker resource a creation call produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Label,
    Issue,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Label => write!(f, "label"),
            ResourceKind::Issue => write!(f, "issue"),
        }
    }
}

/// Outcome of one creation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationResult {
    pub resource_kind: ResourceKind,
    /// Label name or issue title
    pub subject: String,
    /// Issue URL or label name on success, error text on failure
    pub identifier_or_error: String,
    pub succeeded: bool,
    /// Label was already on the tracker
    pub existing: bool,
}

impl CreationResult {
    pub fn success(resource_kind: ResourceKind, subject: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            resource_kind,
            subject: subject.into(),
            identifier_or_error: identifier.into(),
            succeeded: true,
            existing: false,
        }
    }

    pub fn failure(resource_kind: ResourceKind, subject: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            resource_kind,
            subject: subject.into(),
            identifier_or_error: error.into(),
            succeeded: false,
            existing: false,
        }
    }

    pub fn existing(mut self) -> Self {
        self.existing = true;
        self
    }
}

/// A failed creation as persisted in the summary file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub resource_kind: ResourceKind,
    pub identifier_or_title: String,
    pub error: String,
}

/// What a completed run did
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub project_name: String,
    pub repository: RepoCoordinate,
    pub tasks_created: usize,
    pub labels_created: usize,
    pub phases: usize,
    pub failures: Vec<FailureRecord>,
    pub warnings: Vec<PhaseOverflow>,
    pub generated_at: DateTime<Utc>,
    /// Every creation outcome in call order
    #[serde(skip)]
    pub results: Vec<CreationResult>,
}

impl RunSummary {
    pub fn new(
        plan: &ProjectPlan,
        repository: RepoCoordinate,
        results: Vec<CreationResult>,
        warnings: Vec<PhaseOverflow>,
    ) -> Self {
        let count = |kind: ResourceKind| results.iter().filter(|r| r.succeeded && r.resource_kind == kind).count();
        let failures = results
            .iter()
            .filter(|r| !r.succeeded)
            .map(|r| FailureRecord {
                resource_kind: r.resource_kind,
                identifier_or_title: r.subject.clone(),
                error: r.identifier_or_error.clone(),
            })
            .collect();

        Self {
            project_name: plan.project_name().to_string(),
            repository,
            tasks_created: count(ResourceKind::Issue),
            labels_created: count(ResourceKind::Label),
            phases: plan.phases().len(),
            failures,
            warnings,
            generated_at: Utc::now(),
            results,
        }
    }

    /// Successful creations of one kind, in call order
    pub fn created(&self, kind: ResourceKind) -> impl Iterator<Item = &CreationResult> {
        self.results
            .iter()
            .filter(move |r| r.succeeded && r.resource_kind == kind)
    }

    /// Labels that were already on the tracker
    pub fn labels_existing(&self) -> usize {
        self.created(ResourceKind::Label).filter(|r| r.existing).count()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// The persisted JSON form
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Effort, Label, Phase, Priority, Task, TaskType};

    fn plan() -> ProjectPlan {
        ProjectPlan::new(
            "Recipe Box".to_string(),
            "Share recipes".to_string(),
            vec![
                Phase {
                    name: "Setup".to_string(),
                    description: String::new(),
                    order: 1,
                },
                Phase {
                    name: "Build".to_string(),
                    description: String::new(),
                    order: 2,
                },
            ],
            vec![Task {
                title: "Init repo".to_string(),
                description: String::new(),
                phase: "Setup".to_string(),
                priority: Priority::High,
                effort: Effort::OneDay,
                labels: vec![],
                dependencies: vec![],
                task_type: TaskType::Devops,
                position: 0,
            }],
            vec![Label::synthesized("backend")],
        )
    }

    fn summary() -> RunSummary {
        RunSummary::new(
            &plan(),
            RepoCoordinate::new("octo", "recipes"),
            vec![
                CreationResult::success(ResourceKind::Label, "backend", "backend"),
                CreationResult::success(ResourceKind::Label, "priority:high", "priority:high").existing(),
                CreationResult::success(ResourceKind::Issue, "Init repo", "https://github.com/octo/recipes/issues/1"),
                CreationResult::failure(ResourceKind::Issue, "Add auth", "GitHub API error 410: Issues are disabled"),
            ],
            vec![PhaseOverflow {
                phase: "Build".to_string(),
                kept: 10,
                overflow: 2,
            }],
        )
    }

    #[test]
    fn test_counts() {
        let summary = summary();
        assert_eq!(summary.tasks_created, 1);
        assert_eq!(summary.labels_created, 2);
        assert_eq!(summary.labels_existing(), 1);
        assert_eq!(summary.phases, 2);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_persisted_format() {
        let json: serde_json::Value = serde_json::from_str(&summary().to_json().unwrap()).unwrap();

        assert_eq!(json["project_name"], "Recipe Box");
        assert_eq!(json["repository"], "octo/recipes");
        assert_eq!(json["tasks_created"], 1);
        assert_eq!(json["labels_created"], 2);
        assert_eq!(json["phases"], 2);
        assert_eq!(json["failures"][0]["resource_kind"], "issue");
        assert_eq!(json["failures"][0]["identifier_or_title"], "Add auth");
        assert_eq!(json["failures"][0]["error"], "GitHub API error 410: Issues are disabled");
        assert_eq!(json["warnings"][0]["overflow"], 2);
        assert!(json["generated_at"].is_string());
        assert!(json.get("results").is_none());
    }
}
