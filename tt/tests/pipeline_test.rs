//! Integration tests for the planning pipeline
//!
//! Drive the public API from AI response text to creation requests, and run a
//! whole orchestrated plan against in-memory collaborators.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{Value, json};

use todotracker::config::{Config, Overrides, ResolvedConfig};
use todotracker::github::{CreatedIssue, CreatedLabel, GitHubError, IssueTracker, RepositoryInfo};
use todotracker::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use todotracker::planning::{IssueRequest, LabelRequest, PlanNormalizer, map_plan};
use todotracker::prompts::PromptLoader;
use todotracker::validation::parse_response;
use todotracker::{Orchestrator, RepoCoordinate, RunStage};

// =============================================================================
// Fixtures
// =============================================================================

const RESPONSE: &str = r#"<think>The user wants a recipe site. Two phases should do.</think>
```json
{
  "project_name": "Recipe Box",
  "project_summary": "A site for sharing family recipes.",
  "phases": [
    {"name": "Launch", "description": "Ship it", "order": 3},
    {"name": "Foundation", "description": "Repo and CI", "order": 1}
  ],
  "tasks": [
    {"title": "Deploy to production", "description": "Use fly.io", "phase": "Launch",
     "priority": "high", "effort": "1-day", "labels": ["devops"],
     "dependencies": ["Set up CI"], "type": "devops"},
    {"title": "Set up CI", "description": "GitHub Actions", "phase": "Foundation",
     "priority": "High", "effort": "3-days", "labels": ["DevOps", "ci"],
     "dependencies": [], "type": "devops"},
    {"title": "Write README", "description": "", "phase": "Foundation",
     "priority": "low", "effort": "1-day", "labels": [], "dependencies": [], "type": "documentation"}
  ],
  "labels": [
    {"name": "devops", "color": "0000FF", "description": "Infrastructure"},
    {"name": "DevOps", "color": "ff0000", "description": "Duplicate"}
  ]
}
```"#;

fn resolved() -> ResolvedConfig {
    let mut config = Config::default();
    config.retry.initial_backoff_ms = 0;
    config.retry.max_backoff_ms = 0;
    config
        .resolve(&Overrides::default(), |var| match var {
            "OPENROUTER_API_KEY" | "GITHUB_TOKEN" => Some("test-secret".to_string()),
            _ => None,
        })
        .expect("test config resolves")
}

struct ScriptedLlm {
    text: String,
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: Some(self.text.clone()),
            model: request.model,
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })
    }
}

/// Records calls in order; fails any issue whose title is listed
#[derive(Default)]
struct RecordingTracker {
    calls: Mutex<Vec<String>>,
    failing_titles: Vec<String>,
}

#[async_trait]
impl IssueTracker for RecordingTracker {
    async fn repository(&self, repo: &RepoCoordinate) -> Result<RepositoryInfo, GitHubError> {
        self.calls.lock().unwrap().push(format!("repo {repo}"));
        Ok(RepositoryInfo {
            full_name: repo.to_string(),
            html_url: repo.html_url(),
            private: true,
            default_branch: None,
        })
    }

    async fn create_label(&self, _repo: &RepoCoordinate, label: &LabelRequest) -> Result<CreatedLabel, GitHubError> {
        self.calls.lock().unwrap().push(format!("label {}", label.name));
        Ok(CreatedLabel {
            name: label.name.clone(),
            color: label.color.clone(),
            existing: false,
        })
    }

    async fn create_issue(&self, repo: &RepoCoordinate, issue: &IssueRequest) -> Result<CreatedIssue, GitHubError> {
        let number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(format!("issue {}", issue.title));
            calls.len() as u64
        };
        if self.failing_titles.contains(&issue.title) {
            return Err(GitHubError::ApiError {
                status: 410,
                message: "Issues are disabled for this repo".to_string(),
            });
        }
        Ok(CreatedIssue {
            number,
            html_url: format!("{}/issues/{}", repo.html_url(), number),
            title: issue.title.clone(),
        })
    }
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[test]
fn test_response_to_requests() {
    let draft = parse_response(RESPONSE).expect("response validates");
    let normalized = PlanNormalizer::default().normalize(&draft).expect("plan normalizes");
    let plan = &normalized.plan;

    assert_eq!(plan.project_name(), "Recipe Box");
    let phase_names: Vec<&str> = plan.phases().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(phase_names, vec!["Foundation", "Launch"]);

    // Case-insensitive duplicates collapse to the first declaration
    let devops: Vec<_> = plan.labels().iter().filter(|l| l.key() == "devops").collect();
    assert_eq!(devops.len(), 1);
    assert_eq!(devops[0].color, "0000ff");
    // Undeclared task labels are synthesized
    assert!(plan.labels().iter().any(|l| l.name == "ci" && l.color == "808080"));

    let resources = map_plan(plan);
    let titles: Vec<&str> = resources.issues.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Set up CI", "Write README", "Deploy to production"]);

    let deploy = &resources.issues[2];
    assert!(deploy.labels.contains(&"priority:high".to_string()));
    assert!(deploy.labels.contains(&"phase:Launch".to_string()));
    assert!(deploy.body.contains("- [ ] Set up CI"));

    let label_names: HashSet<String> = resources.labels.iter().map(|l| l.name.to_lowercase()).collect();
    assert_eq!(label_names.len(), resources.labels.len(), "label requests are unique");
    for issue in &resources.issues {
        for label in &issue.labels {
            assert!(label_names.contains(&label.to_lowercase()), "issue label {label} has a creation request");
        }
    }
}

#[test]
fn test_label_requests_fit_tracker_limits() {
    let phase = "P".repeat(44);
    let value = json!({
        "project_name": "Limits",
        "project_summary": "",
        "phases": [{"name": phase, "description": "", "order": 1}],
        "tasks": [{
            "title": "Build it",
            "description": "",
            "phase": phase,
            "priority": "low",
            "effort": "2-weeks",
            "labels": ["backend"],
            "dependencies": [],
            "type": "feature"
        }],
        "labels": [{"name": "backend", "color": "00ff00", "description": "b".repeat(150)}]
    });

    let draft = parse_response(&value.to_string()).expect("response validates");
    let plan = PlanNormalizer::default().normalize(&draft).unwrap().plan;
    let resources = map_plan(&plan);

    for label in &resources.labels {
        assert!(label.name.chars().count() <= 50, "{} is too long", label.name);
        assert!(label.description.chars().count() <= 100, "{} description is too long", label.name);
    }
    for label in &resources.issues[0].labels {
        assert!(label.chars().count() <= 50, "{label} is too long");
    }

    // One character more and the phase label would overflow
    let mut value = value;
    value["phases"][0]["name"] = json!("P".repeat(45));
    value["tasks"][0]["labels"] = json!(["x".repeat(60)]);
    let err = parse_response(&value.to_string()).unwrap_err();
    assert!(err.has_path("phases[0].name"));
    assert!(err.has_path("tasks[0].labels[0]"));
}

#[test]
fn test_prose_response_rejected() {
    let err = parse_response("Sure! Here is your plan: {\"project_name\": \"x\"}").unwrap_err();
    assert!(err.has_path("$"));
}

#[tokio::test]
async fn test_orchestrated_run_with_one_failed_issue() {
    let llm = Arc::new(ScriptedLlm {
        text: RESPONSE.to_string(),
    });
    let tracker = Arc::new(RecordingTracker {
        failing_titles: vec!["Write README".to_string()],
        ..Default::default()
    });
    let mut orchestrator = Orchestrator::new(resolved(), llm, tracker.clone(), PromptLoader::embedded_only());
    let repo: RepoCoordinate = "octo/recipes".parse().unwrap();

    let summary = orchestrator.run(&repo, "A recipe sharing site").await.expect("run completes");

    assert_eq!(orchestrator.stage(), RunStage::Summarized);
    assert_eq!(summary.tasks_created, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].identifier_or_title, "Write README");

    let calls = tracker.calls.lock().unwrap().clone();
    assert_eq!(calls[0], "repo octo/recipes");
    let issues: Vec<&String> = calls.iter().filter(|c| c.starts_with("issue ")).collect();
    assert_eq!(issues, vec!["issue Set up CI", "issue Write README", "issue Deploy to production"]);

    let json: Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
    assert_eq!(json["repository"], "octo/recipes");
    assert_eq!(json["failures"][0]["resource_kind"], "issue");
}

// =============================================================================
// Property Tests
// =============================================================================

const PRIORITIES: [&str; 3] = ["high", "medium", "low"];
const EFFORTS: [&str; 4] = ["1-day", "3-days", "1-week", "2-weeks"];
const TYPES: [&str; 6] = ["feature", "bug", "documentation", "testing", "devops", "research"];
const LABEL_POOL: [&str; 6] = ["backend", "Backend", "BACKEND", "ui", "Ui", "infra"];

prop_compose! {
    fn task_json(phase_count: usize)(
        phase in 0..phase_count,
        priority in 0..PRIORITIES.len(),
        effort in 0..EFFORTS.len(),
        kind in 0..TYPES.len(),
        labels in prop::collection::vec(0..LABEL_POOL.len(), 0..4),
    ) -> Value {
        json!({
            "phase": format!("Phase {phase}"),
            "priority": PRIORITIES[priority],
            "effort": EFFORTS[effort],
            "type": TYPES[kind],
            "labels": labels.iter().map(|i| LABEL_POOL[*i]).collect::<Vec<_>>(),
        })
    }
}

fn draft_json() -> impl Strategy<Value = Value> {
    (1usize..5)
        .prop_flat_map(|phase_count| {
            (
                prop::collection::vec(1u32..4, phase_count),
                prop::collection::vec(task_json(phase_count), 0..30),
                prop::collection::vec((0..LABEL_POOL.len(), "[0-9a-f]{6}"), 0..5),
            )
        })
        .prop_map(|(orders, tasks, labels)| {
            let phases: Vec<Value> = orders
                .iter()
                .enumerate()
                .map(|(i, order)| json!({"name": format!("Phase {i}"), "description": "", "order": order}))
                .collect();
            let tasks: Vec<Value> = tasks
                .into_iter()
                .enumerate()
                .map(|(i, mut task)| {
                    task["title"] = json!(format!("Task {i}"));
                    task
                })
                .collect();
            let labels: Vec<Value> = labels
                .into_iter()
                .map(|(i, color)| json!({"name": LABEL_POOL[i], "color": color, "description": "pool"}))
                .collect();
            json!({
                "project_name": "Generated",
                "project_summary": "",
                "phases": phases,
                "tasks": tasks,
                "labels": labels,
            })
        })
}

proptest! {
    #[test]
    fn prop_every_task_resolves_to_a_phase(value in draft_json(), per_phase in 1usize..6) {
        let draft = parse_response(&value.to_string()).unwrap();
        let plan = PlanNormalizer::new(per_phase).normalize(&draft).unwrap().plan;

        for task in plan.tasks() {
            prop_assert!(plan.phase(&task.phase).is_some());
        }
        for phase in plan.phases() {
            prop_assert!(plan.tasks_in_phase(&phase.name).count() <= per_phase);
        }
    }

    #[test]
    fn prop_issue_order_stable_within_phase(value in draft_json()) {
        let draft = parse_response(&value.to_string()).unwrap();
        let plan = PlanNormalizer::default().normalize(&draft).unwrap().plan;
        let resources = map_plan(&plan);

        for phase in plan.phases() {
            let positions: Vec<usize> = resources
                .issues
                .iter()
                .filter(|i| i.phase == phase.name)
                .map(|i| i.position)
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }

        let orders: Vec<u32> = resources
            .issues
            .iter()
            .map(|i| plan.phase(&i.phase).unwrap().order)
            .collect();
        prop_assert!(orders.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn prop_label_dedup_idempotent(value in draft_json()) {
        let draft = parse_response(&value.to_string()).unwrap();
        let normalizer = PlanNormalizer::default();

        let first = normalizer.normalize(&draft).unwrap().plan;
        let second = normalizer.normalize(&draft).unwrap().plan;
        prop_assert_eq!(
            serde_json::to_string(first.labels()).unwrap(),
            serde_json::to_string(second.labels()).unwrap()
        );

        let keys: HashSet<String> = first.labels().iter().map(|l| l.key()).collect();
        prop_assert_eq!(keys.len(), first.labels().len());
    }
}
