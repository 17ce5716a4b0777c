//! Aggregated validation errors

use serde::Serialize;
use thiserror::Error;

/// One schema problem, located by a key/index path such as `tasks[2].priority`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in an AI response, in discovery order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("AI response failed validation with {} violation(s):{}", .violations.len(), render(.violations))]
pub struct ValidationError {
    violations: Vec<Violation>,
}

fn render(violations: &[Violation]) -> String {
    violations.iter().map(|v| format!("\n  - {}", v)).collect()
}

impl ValidationError {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub(crate) fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![Violation {
            path: path.into(),
            message: message.into(),
        }])
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether any violation sits exactly at `path`
    pub fn has_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_every_violation() {
        let err = ValidationError::new(vec![
            Violation {
                path: "tasks[0].priority".to_string(),
                message: "bad".to_string(),
            },
            Violation {
                path: "labels[1].color".to_string(),
                message: "worse".to_string(),
            },
        ]);

        let text = err.to_string();
        assert!(text.contains("2 violation(s)"));
        assert!(text.contains("tasks[0].priority: bad"));
        assert!(text.contains("labels[1].color: worse"));
        assert!(err.has_path("labels[1].color"));
        assert!(!err.has_path("labels"));
    }
}
