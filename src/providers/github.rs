//! GitHub pull request provider
//!
//! Resolves merge commits through the GitHub REST API using octocrab. The
//! provider owns a current-thread tokio runtime and blocks on each request, so
//! callers stay synchronous.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use octocrab::Octocrab;
use regex::Regex;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tokio::runtime::Runtime;

use super::{parse_pull_request_number, ProviderError, PullRequestProvider};
use crate::error::{Result, UnreleasedError};
use crate::models::{PullRequestCommit, PullRequestDto};

const PER_PAGE: u8 = 100;

/// GitHub-backed pull request provider
pub struct GitHubProvider {
    runtime: Runtime,
    octocrab: Octocrab,
    owner: String,
    repo: String,
    web_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    title: Option<String>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    user: Option<ApiUser>,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    commit: ApiCommitDetail,
    #[serde(default)]
    parents: Vec<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    message: String,
}

#[derive(Debug, Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

impl GitHubProvider {
    /// Create a provider for `owner/repo`
    ///
    /// Without a token the API is used anonymously, which is heavily rate limited.
    pub fn new(
        owner: &str,
        repo: &str,
        token: Option<String>,
        web_url: &str,
        api_url: Option<&str>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let octocrab = {
            let _guard = runtime.enter();
            let mut builder = Octocrab::builder();
            match token {
                Some(token) => builder = builder.personal_token(token),
                None => warn!("No GitHub token found, using anonymous API access"),
            }
            if let Some(api_url) = api_url {
                builder = builder.base_uri(api_url).map_err(|e| {
                    UnreleasedError::Config(format!("Invalid GitHub API URL '{}': {}", api_url, e))
                })?;
            }
            builder.build().map_err(convert_error)?
        };

        Ok(Self {
            runtime,
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
            web_url: web_url.trim_end_matches('/').to_string(),
        })
    }

    fn fetch_pull_request(&self, number: u64) -> std::result::Result<Option<PullRequestDto>, ProviderError> {
        debug!("Fetching PR #{} for {}/{}", number, self.owner, self.repo);

        let route = format!("/repos/{}/{}/pulls/{}", self.owner, self.repo, number);
        let result: std::result::Result<ApiPullRequest, octocrab::Error> = self
            .runtime
            .block_on(self.octocrab.get(route, None::<&()>));

        match result {
            Ok(pr) => Ok(Some(convert_pull_request(pr))),
            Err(e) if is_not_found(&e) => {
                debug!("PR #{} not found in {}/{}", number, self.owner, self.repo);
                Ok(None)
            }
            Err(e) => Err(convert_provider_error(e)),
        }
    }
}

impl PullRequestProvider for GitHubProvider {
    fn get(&self, commit_message: &str) -> std::result::Result<Option<PullRequestDto>, ProviderError> {
        match parse_pull_request_number(commit_message) {
            Some(number) => self.fetch_pull_request(number),
            None => Ok(None),
        }
    }

    fn commits(&self, number: u64) -> std::result::Result<Vec<PullRequestCommit>, ProviderError> {
        debug!("Fetching commits of PR #{} for {}/{}", number, self.owner, self.repo);

        let route = format!("/repos/{}/{}/pulls/{}/commits", self.owner, self.repo, number);
        let mut commits = Vec::new();
        let mut page = 1u32;

        loop {
            let params = PageParams {
                per_page: PER_PAGE,
                page,
            };
            let items: Vec<ApiCommit> = self
                .runtime
                .block_on(self.octocrab.get(&route, Some(&params)))
                .map_err(convert_provider_error)?;

            let last_page = items.len() < PER_PAGE as usize;
            commits.extend(items.into_iter().map(|c| PullRequestCommit {
                merge: c.parents.len() > 1,
                message: c.commit.message,
            }));

            if last_page {
                break;
            }
            page += 1;
        }

        debug!("Fetched {} commits of PR #{}", commits.len(), number);
        Ok(commits)
    }

    fn url(&self, number: u64) -> String {
        format!("{}/{}/{}/pull/{}", self.web_url, self.owner, self.repo, number)
    }
}

/// Parse `owner` and `repo` out of a git remote URL
///
/// Handles `https://host/owner/repo(.git)`, `git@host:owner/repo(.git)` and
/// `ssh://git@host/owner/repo(.git)`.
pub fn parse_remote_slug(url: &str) -> Option<(String, String)> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?:[a-z+]+://(?:[^@/]+@)?[^/]+/|[^@/\s]+@[^:/\s]+:)([^/\s]+)/([^/\s]+?)(?:\.git)?/?$",
        )
        .expect("remote pattern is valid")
    });

    let caps = pattern.captures(url.trim())?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Convert the API payload to our PullRequestDto
fn convert_pull_request(pr: ApiPullRequest) -> PullRequestDto {
    let (author, author_url) = match pr.user {
        Some(user) => (user.login, user.html_url),
        None => ("ghost".to_string(), "https://github.com/ghost".to_string()),
    };

    PullRequestDto {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        labels: pr.labels.into_iter().map(|l| l.name).collect(),
        author,
        author_url,
        created_at: pr.created_at,
        merged_at: pr.merged_at,
    }
}

fn status_code(error: &octocrab::Error) -> Option<u16> {
    match error {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

fn is_not_found(error: &octocrab::Error) -> bool {
    status_code(error) == Some(404)
}

/// Map octocrab failures onto the provider error kinds
fn convert_provider_error(error: octocrab::Error) -> ProviderError {
    match status_code(&error) {
        Some(401) | Some(403) => ProviderError::Unauthorized(error.to_string()),
        Some(_) => ProviderError::Unavailable(error.to_string()),
        None => match error {
            octocrab::Error::Serde { .. } | octocrab::Error::Json { .. } => {
                ProviderError::Malformed(error.to_string())
            }
            other => ProviderError::Unavailable(other.to_string()),
        },
    }
}

fn convert_error(error: octocrab::Error) -> UnreleasedError {
    UnreleasedError::Provider(convert_provider_error(error))
}
