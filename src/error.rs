use thiserror::Error;

use crate::providers::ProviderError;

/// Unreleased error types
#[derive(Error, Debug)]
pub enum UnreleasedError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Pull request provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for unreleased operations
pub type Result<T> = std::result::Result<T, UnreleasedError>;
