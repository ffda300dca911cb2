//! State snapshot types.
//!
//! These types mirror the JSON document emitted by `terraform show -json`.
//! Only the parts the import engine reads are modelled; everything else in
//! the document is ignored on deserialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Result, StateError, TfBulkError};

/// A full state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Format version of the JSON representation.
    #[serde(default)]
    pub format_version: String,
    /// Version of the tool that produced the state.
    #[serde(default)]
    pub terraform_version: Option<String>,
    /// State values; absent when the state is empty.
    #[serde(default)]
    pub values: Option<StateValues>,
}

/// The `values` block of a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateValues {
    /// The root module of the tree.
    #[serde(default)]
    pub root_module: StateModule,
}

/// A module node in the state tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateModule {
    /// Module address (absent for the root module).
    #[serde(default)]
    pub address: Option<String>,
    /// Resources declared directly in this module.
    #[serde(default)]
    pub resources: Vec<StateResource>,
    /// Nested modules.
    #[serde(default)]
    pub child_modules: Vec<StateModule>,
}

/// A single resource instance in the state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResource {
    /// Absolute resource address, e.g. `module.net.aws_subnet.this[0]`.
    pub address: String,
    /// Resource mode.
    #[serde(default)]
    pub mode: ResourceMode,
    /// Resource type, e.g. `aws_subnet`.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Resource name, e.g. `this`.
    pub name: String,
    /// Instance key for `count`/`for_each` resources.
    #[serde(default)]
    pub index: Option<Value>,
    /// Provider that manages the resource.
    #[serde(default)]
    pub provider_name: Option<String>,
    /// Attribute values recorded for the instance (`values` in the JSON).
    #[serde(default, rename = "values", alias = "attribute_values")]
    pub attribute_values: Map<String, Value>,
}

/// Resource modes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    /// A resource managed by the stack.
    #[default]
    Managed,
    /// A data source.
    Data,
}

impl StateSnapshot {
    /// Parses a snapshot from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid snapshot document.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            TfBulkError::State(StateError::InvalidSnapshot {
                message: e.to_string(),
            })
        })
    }

    /// Loads a snapshot previously saved with `terraform show -json > file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&content)
    }

    /// Returns the root module, if the state has any values.
    #[must_use]
    pub fn root_module(&self) -> Option<&StateModule> {
        self.values.as_ref().map(|v| &v.root_module)
    }
}

impl StateResource {
    /// Returns true if the resource is managed by the stack.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.mode == ResourceMode::Managed
    }

    /// Looks up an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attribute_values.get(name)
    }
}

impl std::fmt::Display for ResourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            Self::Managed => "managed",
            Self::Data => "data",
        };
        write!(f, "{mode}")
    }
}
