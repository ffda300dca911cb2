//! Plan validation.
//!
//! Validation runs before any state is read so that templating and
//! transform mistakes surface before a single resource is touched.

use crate::address::ImportTemplate;
use crate::error::{ConfigError, Result, TfBulkError};
use crate::pipeline::Transform;
use tracing::debug;

use super::spec::{ImportPlan, ImportStep};

/// Validator for import plans.
#[derive(Debug, Default)]
pub struct PlanValidator;

/// Validation result containing all findings.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl PlanValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a plan, failing on the first error found.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self, plan: &ImportPlan) -> Result<ValidationResult> {
        let result = self.check(plan);

        if let Some(first_error) = result.errors.first() {
            return Err(TfBulkError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )));
        }

        debug!("Plan validation passed");
        Ok(result)
    }

    /// Collects every error and warning without failing.
    #[must_use]
    pub fn check(&self, plan: &ImportPlan) -> ValidationResult {
        let mut result = ValidationResult::default();

        if plan.version.is_empty() {
            result
                .warnings
                .push(String::from("version: no plan version declared"));
        } else if plan.version != super::PLAN_VERSION {
            result.warnings.push(format!(
                "version: unknown plan version '{}', expected '{}'",
                plan.version,
                super::PLAN_VERSION
            ));
        }

        if plan.steps.is_empty() {
            result.warnings.push(String::from("steps: no steps defined"));
        }

        for (i, step) in plan.steps.iter().enumerate() {
            Self::validate_step(step, &format!("steps[{i}]"), &mut result);
        }

        result
    }

    /// Validates a single step.
    fn validate_step(step: &ImportStep, prefix: &str, result: &mut ValidationResult) {
        if step.import_name.is_empty() {
            result.errors.push(ValidationError {
                field: format!("{prefix}.import_name"),
                message: String::from("import_name cannot be empty"),
            });
        } else if let Err(e) = ImportTemplate::parse(&step.import_name) {
            result.errors.push(ValidationError {
                field: format!("{prefix}.import_name"),
                message: e.to_string(),
            });
        }

        if step.for_each.is_incomplete() {
            result.warnings.push(format!(
                "{prefix}.for_each: resource and attribute are both required, step will be skipped"
            ));
        }

        if !step.condition.key.is_empty() && step.condition.key.split('.').any(str::is_empty) {
            result.errors.push(ValidationError {
                field: format!("{prefix}.condition.key"),
                message: format!(
                    "condition key '{}' contains an empty segment",
                    step.condition.key
                ),
            });
        }

        if let Err(e) = Transform::try_from(&step.transform) {
            result.errors.push(ValidationError {
                field: format!("{prefix}.transform"),
                message: e.to_string(),
            });
        }
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
