//! Configuration module
//!
//! Handles loading, saving and validating unreleased.toml configuration files.
//! Defines Config, ProviderConfig, Order, Sections, Categories and Format types.

mod types;

pub use types::{Categories, Config, Format, Order, ProviderConfig, Sections};

use chrono::format::{Item, StrftimeItems};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, UnreleasedError};
use crate::models::labels::fold;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "unreleased.toml";

/// Load configuration from a TOML file
pub fn load(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        UnreleasedError::Config(format!(
            "Cannot read config from '{}': {}. Run 'unreleased config init' to create one.",
            path.display(),
            e
        ))
    })?;

    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a TOML file
pub fn save(config: &Config, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(config)
        .map_err(|e| UnreleasedError::Config(format!("Failed to serialize config: {}", e)))?;

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, toml)?;
    Ok(())
}

/// Parse a `label=description` pair as given on the command line
pub fn parse_label_pair(value: &str) -> Result<(String, String)> {
    match value.split_once('=') {
        Some((label, description)) if !label.trim().is_empty() => {
            Ok((label.trim().to_string(), description.trim().to_string()))
        }
        _ => Err(UnreleasedError::Config(format!(
            "Expected LABEL=DESCRIPTION, got '{}'",
            value
        ))),
    }
}

/// Map `label` to `description`, replacing any entry whose label differs only in case
pub fn set_label(labels: &mut BTreeMap<String, String>, label: String, description: String) {
    let key = fold(&label);
    labels.retain(|existing, _| fold(existing) != key);
    labels.insert(label, description);
}

impl Config {
    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.release_branch.trim().is_empty() {
            return Err(UnreleasedError::Config(
                "release_branch must not be empty".to_string(),
            ));
        }

        if self.follow_label.trim().is_empty() {
            return Err(UnreleasedError::Config(
                "follow_label must not be empty".to_string(),
            ));
        }

        if self.categories.enabled && self.categories.prefix.is_empty() {
            return Err(UnreleasedError::Config(
                "categories.prefix must not be empty when categories are enabled".to_string(),
            ));
        }

        if StrftimeItems::new(&self.format.date).any(|item| matches!(item, Item::Error)) {
            return Err(UnreleasedError::Config(format!(
                "Invalid date format '{}'",
                self.format.date
            )));
        }

        Ok(())
    }
}
