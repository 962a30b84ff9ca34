//! Data collectors module
//!
//! Implements the two collection passes:
//! - UnreleasedCommits: commits on the release branch not yet covered by a release tag
//! - HistoryBuilder: pull requests behind those commits, umbrellas expanded, deduped and ordered

pub mod git;
pub mod history;

pub use git::{CommitGraph, GitRepository, TagFilter, UnreleasedCommits};
pub use history::{HistoryBuilder, OrderKey};
