mod cli;
mod collectors;
mod config;
mod display;
mod error;
mod models;
mod providers;
mod renderer;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

use cli::gen::GenArgs;

#[derive(Parser)]
#[command(name = "unreleased")]
#[command(
    about = "Generate release notes from pull requests merged since the last release tag",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate release notes for unreleased pull requests
    Gen(GenArgs),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Initialize unreleased.toml configuration file
    Init {
        /// Path where to create the config file
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Init { path } => cli::config::init(path),
        },
        Commands::Gen(args) => cli::gen::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
