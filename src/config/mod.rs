//! Configuration module for tfbulk.
//!
//! This module handles the import plan:
//! - Parsing the plan file (JSON or YAML)
//! - Validating steps before any state is read

mod spec;
mod parser;
mod validator;

pub use spec::{Condition, ForEachBlock, ImportPlan, ImportStep, ValueTransform};
pub use parser::{find_plan_file, PlanFormat, PlanParser, DEFAULT_PLAN_FILES};
pub use validator::{PlanValidator, ValidationError, ValidationResult};

/// Current plan format version.
pub const PLAN_VERSION: &str = "1";
