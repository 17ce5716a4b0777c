//! Issue tracker response types

use serde::{Deserialize, Serialize};

/// The repository the run writes into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// A label that exists on the tracker after a create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedLabel {
    pub name: String,
    pub color: String,
    /// The label was already present and was fetched instead of created
    #[serde(skip)]
    pub existing: bool,
}

/// An issue created on the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub number: u64,
    pub html_url: String,
    pub title: String,
}
