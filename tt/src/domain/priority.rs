//! Closed vocabularies for task priority, effort and type

use serde::{Deserialize, Serialize};

/// Priority of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Label color used when the `priority:*` label is created on the tracker
    pub fn color(&self) -> &'static str {
        match self {
            Self::High => "ff0000",
            Self::Medium => "ffa500",
            Self::Low => "808080",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Effort estimate of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Effort {
    #[serde(rename = "1-day")]
    OneDay,
    #[serde(rename = "3-days")]
    ThreeDays,
    #[serde(rename = "1-week")]
    OneWeek,
    #[serde(rename = "2-weeks")]
    TwoWeeks,
}

impl Effort {
    pub const ALL: [Effort; 4] = [Self::OneDay, Self::ThreeDays, Self::OneWeek, Self::TwoWeeks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1-day",
            Self::ThreeDays => "3-days",
            Self::OneWeek => "1-week",
            Self::TwoWeeks => "2-weeks",
        }
    }
}

impl std::fmt::Display for Effort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Effort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1-day" => Ok(Self::OneDay),
            "3-days" => Ok(Self::ThreeDays),
            "1-week" => Ok(Self::OneWeek),
            "2-weeks" => Ok(Self::TwoWeeks),
            _ => Err(format!("Unknown effort: {}", s)),
        }
    }
}

/// Kind of work a task represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Feature,
    Bug,
    Documentation,
    Testing,
    Devops,
    Research,
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        Self::Feature,
        Self::Bug,
        Self::Documentation,
        Self::Testing,
        Self::Devops,
        Self::Research,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Bug => "bug",
            Self::Documentation => "documentation",
            Self::Testing => "testing",
            Self::Devops => "devops",
            Self::Research => "research",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "feature" => Ok(Self::Feature),
            "bug" => Ok(Self::Bug),
            "documentation" => Ok(Self::Documentation),
            "testing" => Ok(Self::Testing),
            "devops" => Ok(Self::Devops),
            "research" => Ok(Self::Research),
            _ => Err(format!("Unknown task type: {}", s)),
        }
    }
}
