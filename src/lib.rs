// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # tfbulk
//!
//! Bulk `terraform import` driven by resources that are already in the state.
//!
//! ## Overview
//!
//! tfbulk adopts existing infrastructure into a Terraform (or OpenTofu) stack
//! by deriving new resource addresses from resources the stack already
//! manages:
//!
//! - Select source resources by type from the applied state
//! - Filter them with a condition over their attribute values
//! - Rewrite their addresses with a template and transform their IDs
//! - Run `terraform import` for each, or just print the commands
//!
//! ## Architecture
//!
//! A run flows strictly downward:
//!
//! 1. **Plan**: Ordered import steps, from a file or the command line
//! 2. **Index**: Resources of the state snapshot, cached per type
//! 3. **Pipeline**: Condition, address template and transform per candidate
//! 4. **Terraform**: The import action, behind the [`terraform::Terraform`] trait
//!
//! ## Modules
//!
//! - [`address`]: Import templates and resource address rewriting
//! - [`config`]: Plan parsing and validation
//! - [`state`]: State snapshot model, resource index and backups
//! - [`pipeline`]: Step compilation, conditions, transforms and execution
//! - [`terraform`]: `terraform` process driver
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```json
//! {
//!   "version": "1",
//!   "steps": [
//!     {
//!       "import_name": "aws_s3_bucket_policy",
//!       "for_each": { "resource": "aws_s3_bucket", "attribute": "bucket" },
//!       "condition": { "key": "policy" }
//!     }
//!   ]
//! }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod address;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod terraform;

// ============================================================================
// Re-exports
// ============================================================================

pub use address::{resolve, ImportTemplate, ResourceAddress};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ImportPlan, ImportStep, PlanParser, PlanValidator};
pub use error::{Result, TfBulkError};
pub use pipeline::{ImportExecutor, RunReport};
pub use state::{ResourceIndex, StateBackup, StateSnapshot};
pub use terraform::{Terraform, TerraformClient};
