use crate::config::{self, Config, DEFAULT_CONFIG_FILE};
use crate::error::Result;
use std::path::PathBuf;

/// Initialize unreleased.toml configuration file
pub fn init(path: Option<PathBuf>) -> Result<()> {
    let config_path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    // Check if file already exists
    if config_path.exists() {
        eprintln!(
            "Configuration file already exists at: {}",
            config_path.display()
        );
        eprintln!("Remove it first if you want to reinitialize.");
        return Ok(());
    }

    config::save(&Config::default(), &config_path)?;

    println!("Configuration file created: {}", config_path.display());
    println!("\nNext steps:");
    println!(
        "1. Edit {} to set the release branch, provider and section labels",
        config_path.display()
    );
    println!("2. Export GITHUB_TOKEN to avoid anonymous API rate limits");
    println!("3. Run 'unreleased gen' to print the release notes");

    Ok(())
}
