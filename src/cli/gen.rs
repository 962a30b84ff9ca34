use clap::Args;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::collectors::{GitRepository, HistoryBuilder, OrderKey, TagFilter, UnreleasedCommits};
use crate::config::{self, Config, DEFAULT_CONFIG_FILE};
use crate::display::{self, ColorChoice};
use crate::error::Result;
use crate::providers;
use crate::renderer::Renderer;

/// Arguments of `unreleased gen`
#[derive(Debug, Args)]
pub struct GenArgs {
    /// Path to config file (defaults to unreleased.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the Git repository
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Release branch (overrides the config)
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Write release notes to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Section mapping LABEL=DESCRIPTION (repeatable, overrides the config)
    #[arg(long = "section", value_name = "LABEL=DESCRIPTION")]
    pub sections: Vec<String>,

    /// Category mapping LABEL=DESCRIPTION (repeatable, overrides the config)
    #[arg(long = "category", value_name = "LABEL=DESCRIPTION")]
    pub categories: Vec<String>,

    /// When to style terminal output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

/// Generate release notes for everything merged since the last release
pub fn run(args: GenArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    let repository = GitRepository::open(&args.repo)?;
    let provider = providers::from_config(&config.provider, &repository)?;

    // Commits on the release branch that no release tag contains
    let commits = UnreleasedCommits::new(&repository).resolve(
        &config.release_branch,
        TagFilter::from_annotated_only(config.annotated_tags_only),
    )?;

    // Pull requests behind those commits
    let history = HistoryBuilder::new(
        provider.as_ref(),
        &config.follow_label,
        OrderKey::from_selector(&config.order.by),
        config.order.descending,
    )
    .build(&commits)?;

    let markdown = Renderer::new(&config, provider.as_ref()).render(&history);

    match args.output {
        Some(path) => {
            write_notes(&path, &markdown)?;
            println!("Release notes written to: {}", path.display());
        }
        None if history.is_empty() => eprintln!("No unreleased pull requests found."),
        None => display::print_markdown(&markdown, args.color),
    }

    Ok(())
}

/// Load the config file and apply command-line overrides
fn resolve_config(args: &GenArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => config::load(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                config::load(default_path)?
            } else {
                info!("No {} found, using default configuration", DEFAULT_CONFIG_FILE);
                Config::default()
            }
        }
    };

    if let Some(branch) = &args.branch {
        config.release_branch = branch.clone();
    }

    for value in &args.sections {
        let (label, description) = config::parse_label_pair(value)?;
        config::set_label(&mut config.sections.labels, label, description);
    }

    for value in &args.categories {
        let (label, description) = config::parse_label_pair(value)?;
        config::set_label(&mut config.categories.labels, label, description);
    }

    config.validate()?;
    Ok(config)
}

fn write_notes(path: &Path, markdown: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, format!("{}\n", markdown))?;
    Ok(())
}
