use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Git Models
// ============================================================================

/// Full hexadecimal object id of a commit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated id (7 characters) for log output
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single Git commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit object id
    pub id: CommitId,
    /// Parent ids, in parent order
    pub parents: Vec<CommitId>,
    /// Full commit message
    pub message: String,
}

impl Commit {
    /// A commit with more than one parent
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// A Git tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name without the `refs/tags/` prefix
    pub name: String,
    /// Tagged commit, `None` when the tag points at a tree or blob
    pub target: Option<CommitId>,
    /// Annotated tag object (as opposed to a lightweight ref)
    pub annotated: bool,
}
