//! Schema validation of the decoded AI response
//!
//! Walks the JSON value once and records every problem it finds instead of
//! stopping at the first one, so a bad response can be reported in full.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::draft::{LabelDraft, PhaseDraft, PlanDraft, TaskDraft};
use super::error::{ValidationError, Violation};
use crate::domain::{Effort, Priority, TaskType};

/// Top-level keys every response must carry
pub const REQUIRED_KEYS: [&str; 5] = ["project_name", "project_summary", "phases", "tasks", "labels"];

/// GitHub rejects label names longer than this
pub const MAX_LABEL_NAME_CHARS: usize = 50;

/// Longest phase name whose derived `phase:{name}` label still fits
pub const MAX_PHASE_NAME_CHARS: usize = MAX_LABEL_NAME_CHARS - "phase:".len();

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]{6}$").expect("valid color regex"));

/// Validate a decoded response against the plan schema
pub fn validate(value: &Value) -> Result<PlanDraft, ValidationError> {
    debug!("validate: called");
    let Some(root) = value.as_object() else {
        return Err(ValidationError::single(
            "$",
            format!("expected a JSON object, found {}", kind(value)),
        ));
    };

    let mut v = Validator::default();

    for key in REQUIRED_KEYS {
        if !root.contains_key(key) {
            v.push(key, "missing required field");
        }
    }

    let project_name = root
        .get("project_name")
        .and_then(|value| v.string(value, "project_name"))
        .and_then(|s| v.non_empty(s, "project_name"));
    let project_summary = root
        .get("project_summary")
        .and_then(|value| v.string(value, "project_summary"));
    let phases = root.get("phases").and_then(|value| v.phases(value));
    let tasks = root.get("tasks").and_then(|value| v.tasks(value));
    let labels = root.get("labels").and_then(|value| v.labels(value));

    if !v.violations.is_empty() {
        debug!(count = v.violations.len(), "validate: rejected");
        return Err(ValidationError::new(v.violations));
    }

    match (project_name, project_summary, phases, tasks, labels) {
        (Some(project_name), Some(project_summary), Some(phases), Some(tasks), Some(labels)) => {
            debug!(
                phases = phases.len(),
                tasks = tasks.len(),
                labels = labels.len(),
                "validate: accepted"
            );
            Ok(PlanDraft {
                project_name,
                project_summary,
                phases,
                tasks,
                labels,
            })
        }
        _ => Err(ValidationError::single("$", "incomplete plan")),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn field(base: &str, key: &str) -> String {
    format!("{}.{}", base, key)
}

fn index(base: &str, idx: usize) -> String {
    format!("{}[{}]", base, idx)
}

#[derive(Default)]
struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.into(),
            message: message.into(),
        });
    }

    fn required<'a>(&mut self, obj: &'a Map<String, Value>, base: &str, key: &str) -> Option<&'a Value> {
        let value = obj.get(key);
        if value.is_none() {
            self.push(field(base, key), "missing required field");
        }
        value
    }

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        let obj = value.as_object();
        if obj.is_none() {
            self.push(path, format!("expected an object, found {}", kind(value)));
        }
        obj
    }

    fn array<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
        let arr = value.as_array();
        if arr.is_none() {
            self.push(path, format!("expected an array, found {}", kind(value)));
        }
        arr
    }

    fn string(&mut self, value: &Value, path: &str) -> Option<String> {
        match value.as_str() {
            Some(s) => Some(s.trim().to_string()),
            None => {
                self.push(path, format!("expected a string, found {}", kind(value)));
                None
            }
        }
    }

    fn non_empty(&mut self, s: String, path: &str) -> Option<String> {
        if s.is_empty() {
            self.push(path, "must not be empty");
            None
        } else {
            Some(s)
        }
    }

    /// Optional string field, empty when absent
    fn optional_string(&mut self, obj: &Map<String, Value>, base: &str, key: &str) -> Option<String> {
        match obj.get(key) {
            None | Some(Value::Null) => Some(String::new()),
            Some(value) => self.string(value, &field(base, key)),
        }
    }

    /// Optional list of strings, each passed through `check`, empty when absent
    fn string_list(
        &mut self,
        obj: &Map<String, Value>,
        base: &str,
        key: &str,
        check: fn(&mut Self, String, &str) -> Option<String>,
    ) -> Option<Vec<String>> {
        let path = field(base, key);
        let items = match obj.get(key) {
            None | Some(Value::Null) => return Some(Vec::new()),
            Some(value) => self.array(value, &path)?,
        };

        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            let item_path = index(&path, i);
            match self.string(item, &item_path).and_then(|s| check(self, s, &item_path)) {
                Some(s) => out.push(s),
                None => ok = false,
            }
        }
        ok.then_some(out)
    }

    /// Phase order: a positive integer, or a number/string that is one
    fn order(&mut self, value: &Value, path: &str) -> Option<u32> {
        let parsed = match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };

        match parsed.and_then(|n| u32::try_from(n).ok()) {
            Some(n) if n > 0 => Some(n),
            _ => {
                self.push(path, format!("expected a positive integer, found {}", value));
                None
            }
        }
    }

    fn vocabulary<T: FromStr>(
        &mut self,
        obj: &Map<String, Value>,
        base: &str,
        key: &str,
        title: &str,
        allowed: &[&str],
    ) -> Option<T> {
        let path = field(base, key);
        let raw = self.required(obj, base, key)?;
        let raw = self.string(raw, &path)?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.push(
                    path,
                    format!(
                        "task \"{}\" has illegal {} \"{}\" (expected one of: {})",
                        title,
                        key,
                        raw,
                        allowed.join(", ")
                    ),
                );
                None
            }
        }
    }

    fn phases(&mut self, value: &Value) -> Option<Vec<PhaseDraft>> {
        let items = self.array(value, "phases")?;
        if items.is_empty() {
            self.push("phases", "must contain at least one phase");
            return None;
        }

        let mut out = Vec::with_capacity(items.len());
        let mut seen = HashSet::new();
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            let base = index("phases", i);
            let Some(obj) = self.object(item, &base) else {
                ok = false;
                continue;
            };

            let name = self
                .required(obj, &base, "name")
                .and_then(|v| self.string(v, &field(&base, "name")))
                .and_then(|s| self.phase_name(s, &field(&base, "name")));
            let description = self.optional_string(obj, &base, "description");
            let order = self
                .required(obj, &base, "order")
                .and_then(|v| self.order(v, &field(&base, "order")));

            if let Some(name) = &name
                && !seen.insert(name.clone())
            {
                self.push(field(&base, "name"), format!("duplicate phase name \"{}\"", name));
                ok = false;
            }

            match (name, description, order) {
                (Some(name), Some(description), Some(order)) => out.push(PhaseDraft {
                    name,
                    description,
                    order,
                }),
                _ => ok = false,
            }
        }
        ok.then_some(out)
    }

    fn tasks(&mut self, value: &Value) -> Option<Vec<TaskDraft>> {
        let items = self.array(value, "tasks")?;

        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            let base = index("tasks", i);
            let Some(obj) = self.object(item, &base) else {
                ok = false;
                continue;
            };

            let title = self
                .required(obj, &base, "title")
                .and_then(|v| self.string(v, &field(&base, "title")))
                .and_then(|s| self.non_empty(s, &field(&base, "title")));
            let shown = title.clone().unwrap_or_else(|| format!("#{}", i));

            let description = self.optional_string(obj, &base, "description");
            let phase = self
                .required(obj, &base, "phase")
                .and_then(|v| self.string(v, &field(&base, "phase")))
                .and_then(|s| self.non_empty(s, &field(&base, "phase")));
            let priority = self.vocabulary::<Priority>(
                obj,
                &base,
                "priority",
                &shown,
                &Priority::ALL.map(|p| p.as_str()),
            );
            let effort = self.vocabulary::<Effort>(obj, &base, "effort", &shown, &Effort::ALL.map(|e| e.as_str()));
            let task_type =
                self.vocabulary::<TaskType>(obj, &base, "type", &shown, &TaskType::ALL.map(|t| t.as_str()));
            let labels = self.string_list(obj, &base, "labels", Self::label_name);
            let dependencies = self.string_list(obj, &base, "dependencies", Self::non_empty);

            match (title, description, phase, priority, effort, task_type, labels, dependencies) {
                (
                    Some(title),
                    Some(description),
                    Some(phase),
                    Some(priority),
                    Some(effort),
                    Some(task_type),
                    Some(labels),
                    Some(dependencies),
                ) => out.push(TaskDraft {
                    title,
                    description,
                    phase,
                    priority,
                    effort,
                    task_type,
                    labels,
                    dependencies,
                }),
                _ => ok = false,
            }
        }
        ok.then_some(out)
    }

    /// Phase names also become `phase:{name}` labels
    fn phase_name(&mut self, name: String, path: &str) -> Option<String> {
        let name = self.non_empty(name, path)?;
        if name.chars().count() > MAX_PHASE_NAME_CHARS {
            self.push(
                path,
                format!("phase name exceeds {} characters", MAX_PHASE_NAME_CHARS),
            );
            return None;
        }
        if name.chars().any(char::is_control) {
            self.push(path, "phase name contains control characters");
            return None;
        }
        Some(name)
    }

    fn label_name(&mut self, name: String, path: &str) -> Option<String> {
        let name = self.non_empty(name, path)?;
        if name.chars().count() > MAX_LABEL_NAME_CHARS {
            self.push(
                path,
                format!("label name exceeds {} characters", MAX_LABEL_NAME_CHARS),
            );
            return None;
        }
        if name.chars().any(char::is_control) {
            self.push(path, "label name contains control characters");
            return None;
        }
        Some(name)
    }

    fn labels(&mut self, value: &Value) -> Option<Vec<LabelDraft>> {
        let items = self.array(value, "labels")?;

        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            let base = index("labels", i);
            let Some(obj) = self.object(item, &base) else {
                ok = false;
                continue;
            };

            let name_path = field(&base, "name");
            let name = self
                .required(obj, &base, "name")
                .and_then(|v| self.string(v, &name_path))
                .and_then(|s| self.label_name(s, &name_path));

            let color_path = field(&base, "color");
            let color = self
                .required(obj, &base, "color")
                .and_then(|v| self.string(v, &color_path))
                .and_then(|c| {
                    if HEX_COLOR.is_match(&c) {
                        Some(c.to_lowercase())
                    } else {
                        self.push(
                            &color_path,
                            format!("color \"{}\" is not six hexadecimal digits", c),
                        );
                        None
                    }
                });
            let description = self.optional_string(obj, &base, "description");

            match (name, color, description) {
                (Some(name), Some(color), Some(description)) => out.push(LabelDraft {
                    name,
                    color,
                    description,
                }),
                _ => ok = false,
            }
        }
        ok.then_some(out)
    }
}
