//! Terraform/OpenTofu integration module.
//!
//! This module wraps the external state-management binary behind a small
//! trait so the import engine can be driven by a real process or a test
//! double.

mod client;

pub use client::{Terraform, TerraformClient, DEFAULT_BINARY};
