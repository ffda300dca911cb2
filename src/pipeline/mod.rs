//! Import pipeline module.
//!
//! This module turns plan steps into import actions:
//! - Compiling steps (template and transform)
//! - Evaluating step conditions
//! - Transforming import IDs
//! - Executing imports and recording the run

pub mod condition;
mod executor;
mod report;
mod step;
pub mod transform;

pub use condition::{check, evaluate, ConditionOutcome};
pub use executor::ImportExecutor;
pub use report::{ImportOutcome, RunReport, SkipReason, StepReport};
pub use step::CompiledStep;
pub use transform::{transform, Transform, SUPPORTED_ACTIONS, USE_SUFFIX};
