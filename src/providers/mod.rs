//! Pull request providers module
//!
//! Resolves merge commit messages to pull request metadata:
//! - GitHubProvider: GitHub REST API through octocrab
//! - FixtureProvider: pull requests described in a local JSON file

pub mod fixture;
pub mod github;

pub use fixture::FixtureProvider;
pub use github::GitHubProvider;

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::collectors::GitRepository;
use crate::config::ProviderConfig;
use crate::error::{Result, UnreleasedError};
use crate::models::{PullRequestCommit, PullRequestDto};

/// Failures of a pull request source
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The source could not be reached or answered with an error.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The source rejected our credentials.
    #[error("source unauthorized: {0}")]
    Unauthorized(String),

    /// The source answered with data we cannot interpret.
    #[error("source malformed: {0}")]
    Malformed(String),
}

/// Read-only access to pull request metadata
pub trait PullRequestProvider {
    /// Resolve a merge commit message to the pull request it merged.
    ///
    /// Returns `Ok(None)` when the message does not reference a known pull request.
    fn get(&self, commit_message: &str) -> std::result::Result<Option<PullRequestDto>, ProviderError>;

    /// Commits belonging to a pull request, in the order the source lists them
    fn commits(&self, number: u64) -> std::result::Result<Vec<PullRequestCommit>, ProviderError>;

    /// Display form of a pull request reference, e.g. `#42`
    fn prefixed_identifier(&self, number: u64) -> String {
        format!("#{}", number)
    }

    /// Web URL of a pull request
    fn url(&self, number: u64) -> String;
}

/// Extract the pull request number from a merge commit message
///
/// Recognizes the `Merge pull request #123 from owner/branch` form.
pub fn parse_pull_request_number(message: &str) -> Option<u64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bmerge pull request #(\d+)").expect("pull request pattern is valid")
    });

    pattern
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Build the configured provider
pub fn from_config(
    config: &ProviderConfig,
    repository: &GitRepository,
) -> Result<Box<dyn PullRequestProvider>> {
    match config {
        ProviderConfig::Fixture { path } => Ok(Box::new(FixtureProvider::load(path)?)),
        ProviderConfig::Github {
            owner,
            repo,
            remote,
            token_env,
            web_url,
            api_url,
        } => {
            let (owner, repo) = match (owner, repo) {
                (Some(owner), Some(repo)) => (owner.clone(), repo.clone()),
                _ => {
                    let url = repository.remote_url(remote)?.ok_or_else(|| {
                        UnreleasedError::Config(format!(
                            "No GitHub owner/repo configured and remote '{}' does not exist",
                            remote
                        ))
                    })?;
                    let (remote_owner, remote_repo) =
                        github::parse_remote_slug(&url).ok_or_else(|| {
                            UnreleasedError::Config(format!(
                                "Cannot infer GitHub owner/repo from remote URL '{}'",
                                url
                            ))
                        })?;
                    (
                        owner.clone().unwrap_or(remote_owner),
                        repo.clone().unwrap_or(remote_repo),
                    )
                }
            };

            let token = std::env::var(token_env)
                .or_else(|_| std::env::var("GH_TOKEN"))
                .ok()
                .filter(|t| !t.trim().is_empty());

            let provider = GitHubProvider::new(
                &owner,
                &repo,
                token,
                web_url,
                api_url.as_deref(),
            )?;
            Ok(Box::new(provider))
        }
    }
}
