use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::labels::fold;

/// Pull request metadata as resolved by a provider
///
/// Two values with the same `number` describe the same pull request,
/// whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDto {
    /// Pull request number
    pub number: u64,
    /// Pull request title
    pub title: String,
    /// Label names
    #[serde(default)]
    pub labels: Vec<String>,
    /// Author login
    pub author: String,
    /// Author profile URL
    pub author_url: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Merge timestamp, absent for unmerged pull requests
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequestDto {
    /// Case-insensitive label membership
    pub fn has_label(&self, label: &str) -> bool {
        let wanted = fold(label);
        self.labels.iter().any(|l| fold(l) == wanted)
    }
}

/// A commit belonging to a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestCommit {
    /// Commit message
    pub message: String,
    /// Whether the commit has more than one parent
    #[serde(default)]
    pub merge: bool,
}
