//! Plan file parser.
//!
//! Plans are JSON by default; files ending in `.yaml` or `.yml` are read as
//! YAML. Both formats map onto the same [`ImportPlan`] structure.

use crate::error::{ConfigError, Result, TfBulkError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::ImportPlan;

/// Plan file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
}

/// Parser for loading import plans.
#[derive(Debug, Default)]
pub struct PlanParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl PlanParser {
    /// Creates a new plan parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path used to look up `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a plan from a file, picking the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ImportPlan> {
        let path = path.as_ref();
        info!("Loading import plan from: {}", path.display());

        if !path.exists() {
            return Err(TfBulkError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            TfBulkError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse(&content, PlanFormat::from_path(path), Some(path))
    }

    /// Parses a plan from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid.
    pub fn parse(
        &self,
        content: &str,
        format: PlanFormat,
        source: Option<&Path>,
    ) -> Result<ImportPlan> {
        debug!("Parsing {:?} import plan", format);

        let parsed: std::result::Result<ImportPlan, String> = match format {
            PlanFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            PlanFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };

        let plan: ImportPlan = parsed.map_err(|message| {
            TfBulkError::Config(ConfigError::ParseError {
                message: format!("{format:?} parse error: {message}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;

        debug!("Parsed import plan with {} step(s)", plan.step_count());
        Ok(plan)
    }

    /// Loads the `.env` file next to the stack, if present.
    ///
    /// Variables loaded here are inherited by the `terraform` child process,
    /// which is how provider credentials usually reach it.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                TfBulkError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

impl PlanFormat {
    /// Picks the format from a file extension; anything but YAML is JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Default plan file names to search for.
pub const DEFAULT_PLAN_FILES: &[&str] = &[
    "tfbulk.json",
    "tfbulk.yaml",
    "tfbulk.yml",
    "import-plan.json",
];

/// Finds a plan file in `start_dir` or one of its parents.
///
/// # Errors
///
/// Returns an error if no plan file is found.
pub fn find_plan_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_PLAN_FILES {
            let plan_path = current.join(filename);
            if plan_path.exists() {
                info!("Found import plan: {}", plan_path.display());
                return Ok(plan_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(TfBulkError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_PLAN_FILES[0]),
    }))
}
