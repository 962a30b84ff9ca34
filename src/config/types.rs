use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Unreleased configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Branch whose history is released next
    pub release_branch: String,

    /// Only annotated tags mark releases
    pub annotated_tags_only: bool,

    /// Label marking umbrella pull requests that are replaced by their children
    pub follow_label: String,

    /// Where pull request metadata comes from
    pub provider: ProviderConfig,

    /// Ordering of the release notes
    pub order: Order,

    /// Top-level grouping by label
    pub sections: Sections,

    /// Second-level grouping by prefixed label
    pub categories: Categories,

    /// Line and date formatting
    pub format: Format,
}

/// Pull request provider selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// GitHub REST API
    Github {
        /// Repository owner, inferred from the remote when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner: Option<String>,
        /// Repository name, inferred from the remote when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        repo: Option<String>,
        /// Remote used to infer owner and repo
        #[serde(default = "default_remote")]
        remote: String,
        /// Environment variable holding the API token
        #[serde(default = "default_token_env")]
        token_env: String,
        /// Base URL for pull request and profile links
        #[serde(default = "default_web_url")]
        web_url: String,
        /// API base URL (GitHub Enterprise)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_url: Option<String>,
    },
    /// Pull requests described in a local JSON file
    Fixture {
        /// Path to the JSON fixture
        path: PathBuf,
    },
}

/// Release note ordering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    /// Timestamp to order by; anything containing "created" selects creation time,
    /// everything else merge time
    pub by: String,

    /// Newest first
    pub descending: bool,
}

/// Section settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Sections {
    /// Group pull requests into sections
    pub enabled: bool,

    /// Heading for pull requests without a section label
    pub fallback: String,

    /// Section label to heading
    pub labels: BTreeMap<String, String>,
}

/// Category settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Categories {
    /// Group section contents into categories
    pub enabled: bool,

    /// Prefix marking category labels (e.g. `#ui`)
    pub prefix: String,

    /// Heading for pull requests without a category label
    pub fallback: String,

    /// Category name (prefix stripped) to heading
    pub labels: BTreeMap<String, String>,
}

/// Output formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    /// Line template; slots {0} title, {1} link, {2} number, {3} created,
    /// {4} merged, {5} author, {6} author link
    pub line: String,

    /// strftime date format
    pub date: String,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_web_url() -> String {
    "https://github.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            release_branch: "main".to_string(),
            annotated_tags_only: false,
            follow_label: "Follow".to_string(),
            provider: ProviderConfig::default(),
            order: Order::default(),
            sections: Sections::default(),
            categories: Categories::default(),
            format: Format::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Github {
            owner: None,
            repo: None,
            remote: default_remote(),
            token_env: default_token_env(),
            web_url: default_web_url(),
            api_url: None,
        }
    }
}

impl Default for Order {
    fn default() -> Self {
        Self {
            by: "merged".to_string(),
            descending: false,
        }
    }
}

impl Default for Sections {
    fn default() -> Self {
        let labels = [
            ("breaking", "Breaking Changes"),
            ("bug", "Fixes & Improvements"),
            ("feature", "New Features"),
        ]
        .into_iter()
        .map(|(label, description)| (label.to_string(), description.to_string()))
        .collect();

        Self {
            enabled: true,
            fallback: "Undefined".to_string(),
            labels,
        }
    }
}

impl Default for Categories {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix: "#".to_string(),
            fallback: "Unclassified".to_string(),
            labels: BTreeMap::new(),
        }
    }
}

impl Default for Format {
    fn default() -> Self {
        Self {
            line: "{0} {1}".to_string(),
            date: "%Y-%m-%d".to_string(),
        }
    }
}
