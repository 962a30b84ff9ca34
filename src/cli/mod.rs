//! Command-line interface module
//!
//! Implements all CLI commands using clap:
//! - config init: Initialize configuration file
//! - gen: Generate release notes for unreleased pull requests

pub mod config;
pub mod gen;
