//! Offline pull request provider backed by a JSON file
//!
//! ```json
//! {
//!   "base_url": "https://github.com/acme/widgets",
//!   "pull_requests": [
//!     {
//!       "number": 5,
//!       "title": "Add widget",
//!       "labels": ["feature"],
//!       "author": "octocat",
//!       "author_url": "https://github.com/octocat",
//!       "created_at": "2024-01-02T10:00:00Z",
//!       "merged_at": "2024-01-03T10:00:00Z",
//!       "commits": [{ "message": "Merge pull request #4 from acme/part", "merge": true }]
//!     }
//!   ]
//! }
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{parse_pull_request_number, ProviderError, PullRequestProvider};
use crate::error::{Result, UnreleasedError};
use crate::models::{PullRequestCommit, PullRequestDto};

/// On-disk fixture document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    /// Repository web URL; pull request links are `{base_url}/pull/{number}`
    pub base_url: String,
    /// Known pull requests
    #[serde(default)]
    pub pull_requests: Vec<FixturePullRequest>,
}

/// A pull request together with its commit listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturePullRequest {
    #[serde(flatten)]
    pub pull_request: PullRequestDto,
    #[serde(default)]
    pub commits: Vec<PullRequestCommit>,
}

/// Pull request provider serving a fixed set of pull requests
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    base_url: String,
    pull_requests: HashMap<u64, FixturePullRequest>,
}

impl FixtureProvider {
    pub fn new(base_url: &str, pull_requests: Vec<FixturePullRequest>) -> Self {
        let pull_requests = pull_requests
            .into_iter()
            .map(|pr| (pr.pull_request.number, pr))
            .collect();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            pull_requests,
        }
    }

    /// Load a fixture document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            UnreleasedError::Config(format!(
                "Cannot read pull request fixture '{}': {}",
                path.display(),
                e
            ))
        })?;

        let fixture: Fixture = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} pull requests from {}",
            fixture.pull_requests.len(),
            path.display()
        );
        Ok(Self::new(&fixture.base_url, fixture.pull_requests))
    }
}

impl PullRequestProvider for FixtureProvider {
    fn get(&self, commit_message: &str) -> std::result::Result<Option<PullRequestDto>, ProviderError> {
        Ok(parse_pull_request_number(commit_message)
            .and_then(|number| self.pull_requests.get(&number))
            .map(|pr| pr.pull_request.clone()))
    }

    fn commits(&self, number: u64) -> std::result::Result<Vec<PullRequestCommit>, ProviderError> {
        Ok(self
            .pull_requests
            .get(&number)
            .map(|pr| pr.commits.clone())
            .unwrap_or_default())
    }

    fn url(&self, number: u64) -> String {
        format!("{}/pull/{}", self.base_url, number)
    }
}
