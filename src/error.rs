//! Error types for the tfbulk import engine.
//!
//! Errors are layered the same way the run is: plan configuration, address
//! templating, value transforms, state handling and the external `terraform`
//! process. Recoverable conditions (skipped steps and candidates) are not
//! errors; they are recorded in the run report instead.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tfbulk.
#[derive(Debug, Error)]
pub enum TfBulkError {
    /// Plan configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Address templating errors.
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    /// Value transform errors.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// State snapshot and backup errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// External `terraform` command errors.
    #[error("Terraform error: {0}")]
    Terraform(#[from] TerraformError),

    /// A fatal error raised while processing a specific plan step.
    #[error("step {index} (`{import_name}`): {source}")]
    Step {
        /// Zero-based position of the step in the plan.
        index: usize,
        /// The step's `import_name` template.
        import_name: String,
        /// The underlying failure.
        #[source]
        source: Box<TfBulkError>,
    },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Plan configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The plan file was not found.
    #[error("Plan file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The plan file could not be parsed.
    #[error("Failed to parse plan: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Plan validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// Address templating errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The import template does not have 1 or 2 elements.
    #[error(
        "invalid import template `{template}`: found {found} element(s), expected 1 (type) or 2 (type.name)"
    )]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// Number of elements found after stripping the index.
        found: usize,
    },

    /// The import template is syntactically malformed.
    #[error("invalid import template `{template}`: {reason}")]
    MalformedTemplate {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A source address from the state could not be parsed.
    #[error("cannot parse resource address `{address}`: {reason}")]
    InvalidAddress {
        /// The offending address.
        address: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Value transform errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// The transform value does not fit the action.
    #[error("invalid value for transform `{action}`: {reason}")]
    InvalidSpec {
        /// Transform action name.
        action: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The transform action is not known.
    #[error("unsupported transform action `{action}`, choose one from: [{choices}]")]
    Unsupported {
        /// The unknown action name.
        action: String,
        /// Comma-separated list of valid actions.
        choices: String,
    },
}

/// State snapshot and backup errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// The state snapshot could not be parsed.
    #[error("failed to parse state snapshot: {message}")]
    InvalidSnapshot {
        /// Description of the parse error.
        message: String,
    },

    /// The state backup could not be written.
    #[error("failed to write state backup to {path}: {message}")]
    BackupFailed {
        /// Destination of the backup.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

/// External `terraform` command errors.
#[derive(Debug, Error)]
pub enum TerraformError {
    /// The binary could not be started.
    #[error("cannot run `{binary}`: {message}")]
    NotInstalled {
        /// Binary that was looked up.
        binary: String,
        /// OS error description.
        message: String,
    },

    /// The command exited unsuccessfully.
    #[error("`{command}` failed (exit code {code}): {stderr}")]
    CommandFailed {
        /// Command line that was run.
        command: String,
        /// Exit code, or -1 when killed by a signal.
        code: i32,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// The command produced output that could not be understood.
    #[error("unexpected output from `{command}`: {message}")]
    InvalidOutput {
        /// Command line that was run.
        command: String,
        /// Description of the problem.
        message: String,
    },
}

/// Result type alias for tfbulk operations.
pub type Result<T> = std::result::Result<T, TfBulkError>;

impl TfBulkError {
    /// Wraps this error with the step that raised it.
    #[must_use]
    pub fn in_step(self, index: usize, import_name: impl Into<String>) -> Self {
        Self::Step {
            index,
            import_name: import_name.into(),
            source: Box::new(self),
        }
    }

    /// Returns true if the error came from an external `terraform` action.
    ///
    /// Such failures stop the run without retry; re-running after inspection
    /// is safe because already-imported resources are reported as such by
    /// `terraform` itself.
    #[must_use]
    pub fn is_external(&self) -> bool {
        match self {
            Self::Terraform(_) | Self::State(StateError::BackupFailed { .. }) => true,
            Self::Step { source, .. } => source.is_external(),
            _ => false,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl TransformError {
    /// Creates an invalid spec error for the given action.
    #[must_use]
    pub fn invalid_spec(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

impl TerraformError {
    /// Creates an invalid output error.
    #[must_use]
    pub fn invalid_output(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOutput {
            command: command.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_context_in_message() {
        let err = TfBulkError::from(AddressError::InvalidTemplate {
            template: String::from("a.b.c"),
            found: 3,
        })
        .in_step(2, "a.b.c");

        let message = err.to_string();
        assert!(message.starts_with("step 2 (`a.b.c`)"));
        assert!(message.contains("found 3 element(s)"));
    }

    #[test]
    fn test_is_external() {
        let failed = TfBulkError::from(TerraformError::CommandFailed {
            command: String::from("terraform import a b"),
            code: 1,
            stderr: String::from("boom"),
        });
        assert!(failed.is_external());
        assert!(failed.in_step(0, "x").is_external());

        let templating = TfBulkError::from(TransformError::invalid_spec("useSuffix", "bad"));
        assert!(!templating.is_external());
    }
}
