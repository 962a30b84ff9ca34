//! Data models module
//!
//! Defines domain models for the commit graph and pull request metadata.
//! Includes Commit, CommitId, Tag, PullRequestDto, PullRequestCommit, LabelMap.

pub mod labels;
pub mod pull_request;
pub mod source;

pub use labels::LabelMap;
pub use pull_request::{PullRequestCommit, PullRequestDto};
pub use source::{Commit, CommitId, Tag};
