//! Color decision for terminal output

use clap::ValueEnum;
use std::io::IsTerminal;

/// `--color` setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Decide from the environment and whether stdout is a terminal
    #[default]
    Auto,
    /// Always style output
    Always,
    /// Never style output
    Never,
}

/// Determine if colors should be used for the given choice
pub fn should_use_colors(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => color_from_env().unwrap_or_else(|| std::io::stdout().is_terminal()),
    }
}

/// Color preference expressed through environment variables, if any
///
/// NO_COLOR wins over CLICOLOR_FORCE, which wins over CLICOLOR=0.
fn color_from_env() -> Option<bool> {
    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return Some(false);
    }

    if let Ok(val) = std::env::var("CLICOLOR_FORCE") {
        if val != "0" {
            return Some(true);
        }
    }

    match std::env::var("CLICOLOR") {
        Ok(val) if val == "0" => Some(false),
        _ => None,
    }
}
