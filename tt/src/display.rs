//! Console rendering
//!
//! Everything is rendered to a `String` first so output can be tested; the
//! binary prints it.

use std::fmt::Write;

use colored::*;

use crate::domain::RepoCoordinate;
use crate::orchestrator::{PlannedRun, ResourceKind, RunError, RunFailure, RunSummary};
use crate::planning::PhaseOverflow;

/// Labels listed before the rest are elided
const SHOW_LABELS: usize = 10;

/// Issues listed before the rest are elided
const SHOW_ISSUES: usize = 5;

fn swatch(hex: &str) -> ColoredString {
    let channel = |i: usize| hex.get(i..i + 2).and_then(|c| u8::from_str_radix(c, 16).ok());
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => "●".truecolor(r, g, b),
        _ => "●".normal(),
    }
}

fn render_warnings(out: &mut String, warnings: &[PhaseOverflow]) {
    for warning in warnings {
        let _ = writeln!(out, "{} {}", "⚠".yellow(), warning.to_string().yellow());
    }
}

/// The accepted plan and the requests a run would issue
pub fn render_plan(planned: &PlannedRun) -> String {
    let plan = &planned.normalized.plan;
    let mut out = String::new();

    let _ = writeln!(out, "{}", plan.project_name().bold());
    if !plan.project_summary().is_empty() {
        let _ = writeln!(out, "{}", plan.project_summary().dimmed());
    }
    let _ = writeln!(out);

    for phase in plan.phases() {
        let _ = writeln!(out, "{} {}", format!("Phase {}:", phase.order).cyan(), phase.name.bold());
        for task in plan.tasks_in_phase(&phase.name) {
            let _ = writeln!(
                out,
                "  - {} {}",
                task.title,
                format!("[{} | {} | {}]", task.priority, task.effort, task.task_type).dimmed()
            );
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{} {} labels, {} issues",
        "Would create:".bold(),
        planned.resources.labels.len(),
        planned.resources.issues.len()
    );
    for label in &planned.resources.labels {
        let _ = writeln!(out, "  {} {} {}", swatch(&label.color), label.name, label.description.dimmed());
    }
    for (i, issue) in planned.resources.issues.iter().enumerate() {
        let _ = writeln!(out, "  {}. {} {}", i + 1, issue.title, issue.labels.join(", ").dimmed());
    }
    render_warnings(&mut out, &planned.normalized.warnings);
    let _ = writeln!(
        out,
        "{}",
        format!(
            "model {} | {} tokens in, {} out",
            planned.model, planned.usage.input_tokens, planned.usage.output_tokens
        )
        .dimmed()
    );
    out
}

/// Results of a completed run
pub fn render_summary(summary: &RunSummary, board_hint: bool) -> String {
    let mut out = String::new();
    let repo: &RepoCoordinate = &summary.repository;

    let headline = if summary.has_failures() {
        "Project created with some failures".yellow().bold()
    } else {
        "Project created".green().bold()
    };
    let _ = writeln!(out, "{} {}", headline, repo.to_string().dimmed());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "Summary:".bold());
    let _ = writeln!(out, "  Project: {}", summary.project_name);
    let _ = writeln!(out, "  Tasks created: {}", summary.tasks_created);
    let existing = summary.labels_existing();
    if existing > 0 {
        let _ = writeln!(out, "  Labels created: {} ({} already existed)", summary.labels_created, existing);
    } else {
        let _ = writeln!(out, "  Labels created: {}", summary.labels_created);
    }
    let _ = writeln!(out, "  Phases: {}", summary.phases);

    let labels: Vec<_> = summary.created(ResourceKind::Label).collect();
    if !labels.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "Labels:".bold());
        for label in labels.iter().take(SHOW_LABELS) {
            let _ = writeln!(out, "  {}", label.subject);
        }
        if labels.len() > SHOW_LABELS {
            let _ = writeln!(out, "  {}", format!("... and {} more", labels.len() - SHOW_LABELS).dimmed());
        }
    }

    let issues: Vec<_> = summary.created(ResourceKind::Issue).collect();
    if !issues.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "Issues:".bold());
        for (i, issue) in issues.iter().take(SHOW_ISSUES).enumerate() {
            let _ = writeln!(out, "  {}. {} {}", i + 1, issue.subject, issue.identifier_or_error.dimmed());
        }
        if issues.len() > SHOW_ISSUES {
            let _ = writeln!(out, "  {}", format!("... and {} more issues", issues.len() - SHOW_ISSUES).dimmed());
        }
    }

    if summary.has_failures() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "Failures:".red().bold());
        for failure in &summary.failures {
            let _ = writeln!(
                out,
                "  {} {} \"{}\": {}",
                "✗".red(),
                failure.resource_kind,
                failure.identifier_or_title,
                failure.error.red()
            );
        }
    }

    if !summary.warnings.is_empty() {
        let _ = writeln!(out);
        render_warnings(&mut out, &summary.warnings);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "Next steps:".green().bold());
    let _ = writeln!(out, "  1. View repository: {}", repo.html_url());
    let _ = writeln!(out, "  2. Check issues: {}/issues", repo.html_url());
    if board_hint {
        let _ = writeln!(
            out,
            "  3. Create a project board at {}/projects and add the new issues to it",
            repo.html_url()
        );
    }
    out
}

/// A fatal run failure: one cause line, plus every violation for bad AI output
pub fn render_failure(failure: &RunFailure) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "✗".red(), format!("Failed at stage {}", failure.stage).red().bold());
    let _ = writeln!(out, "  {}", failure.error);
    let attempts = match &failure.error {
        RunError::Completion(e) => e.attempts(),
        RunError::Repository(e) => e.attempts(),
        _ => None,
    };
    if let Some(attempts) = attempts {
        let _ = writeln!(
            out,
            "  {}",
            format!("Gave up after {} attempts; try again later.", attempts).yellow()
        );
    }
    if !failure.stage.touches_tracker() {
        let _ = writeln!(out, "  {}", "No labels or issues were created.".dimmed());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::github::GitHubError;
    use crate::llm::{LlmError, TokenUsage};
    use crate::orchestrator::{CreationResult, RunStage};
    use crate::retry::RetryError;
    use crate::validation::parse_response;

    fn summary(results: Vec<CreationResult>) -> RunSummary {
        let draft = parse_response(
            r#"{"project_name": "Recipe Box", "project_summary": "Share recipes",
                "phases": [{"name": "Setup", "description": "", "order": 1}],
                "tasks": [], "labels": []}"#,
        )
        .unwrap();
        let normalized = crate::planning::PlanNormalizer::default().normalize(&draft).unwrap();
        RunSummary::new(
            &normalized.plan,
            RepoCoordinate::new("octo", "recipes"),
            results,
            vec![],
        )
    }

    #[test]
    fn test_summary_lists_counts_and_links() {
        let text = render_summary(
            &summary(vec![
                CreationResult::success(ResourceKind::Label, "backend", "backend"),
                CreationResult::success(ResourceKind::Issue, "Init repo", "https://github.com/octo/recipes/issues/1"),
            ]),
            true,
        );

        assert!(text.contains("Tasks created: 1"));
        assert!(text.contains("Labels created: 1"));
        assert!(text.contains("https://github.com/octo/recipes/issues"));
        assert!(text.contains("projects"));
    }

    #[test]
    fn test_summary_without_board_hint() {
        let text = render_summary(&summary(vec![]), false);
        assert!(!text.contains("project board"));
    }

    #[test]
    fn test_summary_lists_failures() {
        let text = render_summary(
            &summary(vec![CreationResult::failure(ResourceKind::Issue, "Add auth", "boom")]),
            false,
        );
        assert!(text.contains("Failures:"));
        assert!(text.contains("\"Add auth\""));
    }

    #[test]
    fn test_summary_elides_long_lists() {
        let results = (0..8)
            .map(|i| CreationResult::success(ResourceKind::Issue, format!("Issue {i}"), format!("url{i}")))
            .collect();
        let text = render_summary(&summary(results), false);
        assert!(text.contains("Issue 4"));
        assert!(!text.contains("Issue 5"));
        assert!(text.contains("... and 3 more issues"));
    }

    #[test]
    fn test_render_failure_shows_violations() {
        let err = parse_response(r#"{"project_name": ""}"#).unwrap_err();
        let failure = RunFailure::new(RunStage::Validated, err);
        let text = render_failure(&failure);
        assert!(text.contains("validated"));
        assert!(text.contains("project_name"));
        assert!(text.contains("No labels or issues were created."));
    }

    #[test]
    fn test_render_failure_before_issue_stage() {
        let missing = RetryError::Fatal {
            operation: "repository octo/recipes".to_string(),
            source: GitHubError::RepositoryNotFound("octo/recipes".to_string()),
        };
        let text = render_failure(&RunFailure::new(RunStage::LabelsCreated, missing));
        assert!(text.contains("No labels or issues were created."));
        assert!(!text.contains("Gave up"));

        let exhausted = RetryError::Exhausted {
            operation: "completion".to_string(),
            attempts: 3,
            source: LlmError::Timeout(Duration::from_secs(60)),
        };
        let text = render_failure(&RunFailure::new(RunStage::AiResponseReceived, exhausted));
        assert!(text.contains("No labels or issues were created."));
        assert!(text.contains("Gave up after 3 attempts"));

        let text = render_failure(&RunFailure::new(RunStage::AiResponseReceived, RunError::EmptyResponse));
        assert!(text.contains("No labels or issues were created."));
    }

    #[test]
    fn test_render_failure_after_creation_started() {
        let text = render_failure(&RunFailure::new(RunStage::IssuesCreated, RunError::EmptyResponse));
        assert!(!text.contains("No labels or issues were created."));
    }

    #[test]
    fn test_plan_lists_issue_requests_in_order() {
        let draft = parse_response(
            r#"{"project_name": "Recipe Box", "project_summary": "",
                "phases": [{"name": "Launch", "description": "", "order": 2},
                           {"name": "Setup", "description": "", "order": 1}],
                "tasks": [
                    {"title": "Deploy", "description": "", "phase": "Launch", "priority": "high",
                     "effort": "1-day", "labels": [], "dependencies": [], "type": "devops"},
                    {"title": "Init repo", "description": "", "phase": "Setup", "priority": "low",
                     "effort": "1-day", "labels": ["infra"], "dependencies": [], "type": "feature"}
                ],
                "labels": []}"#,
        )
        .unwrap();
        let normalized = crate::planning::PlanNormalizer::default().normalize(&draft).unwrap();
        let resources = crate::planning::map_plan(&normalized.plan);
        let planned = PlannedRun {
            normalized,
            resources,
            model: "test/model".to_string(),
            usage: TokenUsage::default(),
        };

        let text = render_plan(&planned);
        let init = text.find("1. Init repo").expect("first issue listed");
        let deploy = text.find("2. Deploy").expect("second issue listed");
        assert!(init < deploy);
        assert!(text.contains("phase:Launch"));
        assert!(text.contains("infra"));
    }

    #[test]
    fn test_swatch_tolerates_bad_hex() {
        assert!(swatch("zz").to_string().contains('●'));
        assert!(swatch("ff0000").to_string().contains('●'));
    }
}
