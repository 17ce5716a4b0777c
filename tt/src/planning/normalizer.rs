//! PlanNormalizer - turn a validated draft into the run's ProjectPlan
//!
//! Sorts phases, resolves task phase references, clamps tasks per phase and
//! settles the label palette. Unresolvable phase references fail the whole
//! plan; over-full phases only produce warnings.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Label, Phase, ProjectPlan, Task};
use crate::validation::PlanDraft;

/// Default clamp on tasks kept per phase
pub const DEFAULT_MAX_TASKS_PER_PHASE: usize = 10;

/// A task pointing at a phase the plan never declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedPhase {
    pub task: String,
    pub phase: String,
}

impl std::fmt::Display for UnresolvedPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task \"{}\" references unknown phase \"{}\"", self.task, self.phase)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("{} task(s) reference undeclared phases:{}", .0.len(), render(.0))]
    UnresolvedPhases(Vec<UnresolvedPhase>),
}

fn render(unresolved: &[UnresolvedPhase]) -> String {
    unresolved.iter().map(|u| format!("\n  - {}", u)).collect()
}

/// Tasks dropped from a phase that exceeded the per-phase limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseOverflow {
    pub phase: String,
    pub kept: usize,
    pub overflow: usize,
}

impl std::fmt::Display for PhaseOverflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "phase \"{}\" kept {} task(s), dropped {} over the limit",
            self.phase, self.kept, self.overflow
        )
    }
}

/// Normalized plan plus the non-fatal warnings raised while building it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPlan {
    pub plan: ProjectPlan,
    pub warnings: Vec<PhaseOverflow>,
}

/// Builds a [`ProjectPlan`] from a [`PlanDraft`]
#[derive(Debug, Clone)]
pub struct PlanNormalizer {
    max_tasks_per_phase: usize,
}

impl Default for PlanNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TASKS_PER_PHASE)
    }
}

impl PlanNormalizer {
    /// `max_tasks_per_phase` of 0 is treated as 1
    pub fn new(max_tasks_per_phase: usize) -> Self {
        Self {
            max_tasks_per_phase: max_tasks_per_phase.max(1),
        }
    }

    pub fn max_tasks_per_phase(&self) -> usize {
        self.max_tasks_per_phase
    }

    pub fn normalize(&self, draft: &PlanDraft) -> Result<NormalizedPlan, NormalizationError> {
        debug!(
            phases = draft.phases.len(),
            tasks = draft.tasks.len(),
            labels = draft.labels.len(),
            "normalize: called"
        );

        let phases = sort_phases(draft);

        // Resolve every reference before dropping anything
        let known: HashSet<&str> = phases.iter().map(|p| p.name.as_str()).collect();
        let unresolved: Vec<UnresolvedPhase> = draft
            .tasks
            .iter()
            .filter(|t| !known.contains(t.phase.as_str()))
            .map(|t| UnresolvedPhase {
                task: t.title.clone(),
                phase: t.phase.clone(),
            })
            .collect();
        if !unresolved.is_empty() {
            debug!(count = unresolved.len(), "normalize: unresolved phase references");
            return Err(NormalizationError::UnresolvedPhases(unresolved));
        }

        let (tasks, warnings) = self.clamp_tasks(draft, &phases);
        let labels = settle_labels(draft, &tasks);

        info!(
            project = %draft.project_name,
            phases = phases.len(),
            tasks = tasks.len(),
            labels = labels.len(),
            overflowing_phases = warnings.len(),
            "Plan normalized"
        );

        Ok(NormalizedPlan {
            plan: ProjectPlan::new(
                draft.project_name.clone(),
                draft.project_summary.clone(),
                phases,
                tasks,
                labels,
            ),
            warnings,
        })
    }

    /// Keep the first N tasks of each phase, in original order
    fn clamp_tasks(&self, draft: &PlanDraft, phases: &[Phase]) -> (Vec<Task>, Vec<PhaseOverflow>) {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut tasks = Vec::with_capacity(draft.tasks.len());

        for (position, t) in draft.tasks.iter().enumerate() {
            let count = counts.entry(t.phase.as_str()).or_default();
            *count += 1;
            if *count > self.max_tasks_per_phase {
                continue;
            }
            tasks.push(Task {
                title: t.title.clone(),
                description: t.description.clone(),
                phase: t.phase.clone(),
                priority: t.priority,
                effort: t.effort,
                labels: dedup_names(&t.labels),
                dependencies: t.dependencies.clone(),
                task_type: t.task_type,
                position,
            });
        }

        let warnings: Vec<PhaseOverflow> = phases
            .iter()
            .filter_map(|p| {
                let total = counts.get(p.name.as_str()).copied().unwrap_or(0);
                (total > self.max_tasks_per_phase).then(|| PhaseOverflow {
                    phase: p.name.clone(),
                    kept: self.max_tasks_per_phase,
                    overflow: total - self.max_tasks_per_phase,
                })
            })
            .collect();

        for w in &warnings {
            warn!(phase = %w.phase, kept = w.kept, overflow = w.overflow, "Phase over task limit");
        }

        (tasks, warnings)
    }
}

/// Ascending by order; `sort_by_key` is stable so ties keep declaration order
fn sort_phases(draft: &PlanDraft) -> Vec<Phase> {
    let mut phases: Vec<Phase> = draft
        .phases
        .iter()
        .map(|p| Phase {
            name: p.name.clone(),
            description: p.description.clone(),
            order: p.order,
        })
        .collect();
    phases.sort_by_key(|p| p.order);
    phases
}

/// Case-insensitive dedup, first spelling wins
fn dedup_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|n| seen.insert(n.to_lowercase()))
        .cloned()
        .collect()
}

/// Declared labels first (deduplicated), then labels synthesized from task references
fn settle_labels(draft: &PlanDraft, tasks: &[Task]) -> Vec<Label> {
    let mut seen = HashSet::new();
    let mut labels = Vec::new();

    for l in &draft.labels {
        let label = Label::new(&l.name, &l.color, &l.description);
        if seen.insert(label.key()) {
            labels.push(label);
        } else {
            debug!(name = %l.name, "settle_labels: dropping duplicate declared label");
        }
    }

    for name in tasks.iter().flat_map(|t| t.labels.iter()) {
        let label = Label::synthesized(name);
        if seen.insert(label.key()) {
            debug!(%name, "settle_labels: synthesizing undeclared label");
            labels.push(label);
        }
    }

    labels
}
