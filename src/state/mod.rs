//! State module.
//!
//! This module models the applied state snapshot, indexes its resources by
//! type and writes the optional pre-flight backup.

mod backup;
mod index;
mod types;

pub use backup::StateBackup;
pub use index::ResourceIndex;
pub use types::{ResourceMode, StateModule, StateResource, StateSnapshot, StateValues};
