//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::terraform::DEFAULT_BINARY;

/// tfbulk - Bulk `terraform import` from existing state.
#[derive(Parser, Debug)]
#[command(name = "tfbulk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Stack directory to run `terraform` in.
    #[arg(short = 'd', long, global = true, default_value = ".", env = "TFBULK_WORKING_DIR")]
    pub working_dir: PathBuf,

    /// Only print the import commands that would run.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Back up the state before importing.
    #[arg(long, global = true)]
    pub backup: bool,

    /// Directory for state backups.
    #[arg(long, global = true, default_value = ".", env = "TFBULK_BACKUP_DIR")]
    pub backup_dir: PathBuf,

    /// Terraform (or OpenTofu) binary.
    #[arg(long = "terraform-bin", global = true, default_value = DEFAULT_BINARY, env = "TFBULK_TERRAFORM_BIN")]
    pub terraform_bin: String,

    /// Read the state from a `show -json` file instead of the binary.
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Do not run `terraform init` before reading the state.
    #[arg(long, global = true)]
    pub skip_init: bool,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an import plan file.
    FromFile {
        /// Path to the plan file (JSON or YAML). Searched for when omitted.
        #[arg(short = 'f', long = "config", env = "TFBULK_PLAN")]
        config: Option<PathBuf>,
    },

    /// Import every resource of one type under new addresses.
    FromResource {
        /// Source resource type, e.g. `aws_s3_bucket`.
        #[arg(short = 't', long)]
        resource_type: String,

        /// Source attribute holding the import ID, e.g. `bucket`.
        #[arg(short = 'a', long)]
        resource_attr: String,

        /// Target address templates, e.g. `aws_s3_bucket_acl`.
        #[arg(required = true, num_args = 1..)]
        templates: Vec<String>,
    },

    /// Validate a plan file without touching the state.
    Validate {
        /// Path to the plan file. Searched for when omitted.
        #[arg(short = 'f', long = "config", env = "TFBULK_PLAN")]
        config: Option<PathBuf>,

        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
