//! CLI module for tfbulk.
//!
//! This module provides the command-line interface for bulk imports.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
