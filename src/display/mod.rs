//! Terminal display module
//!
//! Prints release notes to the terminal, styled when colors are wanted.

mod formatter;
mod terminal;

pub use formatter::print_markdown;
pub use terminal::ColorChoice;
