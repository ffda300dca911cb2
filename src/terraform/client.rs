//! `terraform` process driver.
//!
//! The import engine talks to the state-management binary only through the
//! [`Terraform`] trait. [`TerraformClient`] implements it by spawning the
//! binary (Terraform or OpenTofu) in the stack's working directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, trace};

use crate::error::{Result, TerraformError};
use crate::state::StateSnapshot;

/// Default binary name.
pub const DEFAULT_BINARY: &str = "terraform";

/// Operations the import engine needs from the state-management binary.
#[async_trait]
pub trait Terraform: Send + Sync {
    /// Reads the current state as a structured snapshot (`show -json`).
    async fn show_state(&self) -> Result<StateSnapshot>;

    /// Imports the object identified by `id` into `address`.
    async fn import(&self, address: &str, id: &str) -> Result<()>;

    /// Reads the raw persisted state (`state pull`).
    async fn pull_state(&self) -> Result<String>;
}

/// Process-backed [`Terraform`] implementation.
#[derive(Debug, Clone)]
pub struct TerraformClient {
    /// Binary to run.
    binary: String,
    /// Stack directory the binary runs in.
    working_dir: PathBuf,
}

impl TerraformClient {
    /// Creates a client running `binary` inside `working_dir`.
    #[must_use]
    pub fn new(binary: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Creates a client using the default `terraform` binary.
    #[must_use]
    pub fn with_working_dir(working_dir: impl Into<PathBuf>) -> Self {
        Self::new(DEFAULT_BINARY, working_dir)
    }

    /// Returns the binary name.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Returns the working directory.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Initializes the working directory (`init`).
    ///
    /// # Errors
    ///
    /// Returns an error if the binary cannot be run or init fails.
    pub async fn init(&self) -> Result<()> {
        info!("Running {} init in {}", self.binary, self.working_dir.display());
        self.run(&["init", "-input=false", "-no-color"]).await?;
        Ok(())
    }

    /// Runs the binary with `args` and returns its output on success.
    async fn run(&self, args: &[&str]) -> Result<Output> {
        let command_line = self.command_line(args);
        debug!("Executing: {}", command_line);

        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TerraformError::NotInstalled {
                binary: self.binary.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(TerraformError::CommandFailed {
                command: command_line,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        trace!("{} produced {} bytes of output", command_line, output.stdout.len());
        Ok(output)
    }

    /// Renders a command line for logs and errors.
    fn command_line(&self, args: &[&str]) -> String {
        std::iter::once(self.binary.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Decodes stdout as UTF-8.
    fn stdout_text(&self, args: &[&str], output: Output) -> Result<String> {
        String::from_utf8(output.stdout).map_err(|e| {
            TerraformError::invalid_output(self.command_line(args), e.to_string()).into()
        })
    }
}

#[async_trait]
impl Terraform for TerraformClient {
    async fn show_state(&self) -> Result<StateSnapshot> {
        const ARGS: &[&str] = &["show", "-json", "-no-color"];

        let output = self.run(ARGS).await?;
        let text = self.stdout_text(ARGS, output)?;

        StateSnapshot::from_json(&text).map_err(|e| {
            TerraformError::invalid_output(self.command_line(ARGS), e.to_string()).into()
        })
    }

    async fn import(&self, address: &str, id: &str) -> Result<()> {
        self.run(&["import", "-input=false", "-no-color", address, id])
            .await?;
        Ok(())
    }

    async fn pull_state(&self) -> Result<String> {
        const ARGS: &[&str] = &["state", "pull"];

        let output = self.run(ARGS).await?;
        self.stdout_text(ARGS, output)
    }
}
