//! Plan file specification types.
//!
//! These structs map to the import plan file. Every field is optional in the
//! file; absent fields fall back to empty, no-op defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The root of an import plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportPlan {
    /// Plan format version.
    pub version: String,
    /// Import steps, applied in order.
    pub steps: Vec<ImportStep>,
}

/// One unit of import work.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportStep {
    /// Target address template, e.g. `aws_s3_bucket_policy` or
    /// `aws_s3_bucket_acl.main[0]`.
    pub import_name: String,
    /// Source resources to import from.
    pub for_each: ForEachBlock,
    /// Optional condition on the source resource.
    pub condition: Condition,
    /// Optional transform applied to the extracted value.
    pub transform: ValueTransform,
}

/// Selects source resources and the attribute used as the import ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ForEachBlock {
    /// Source resource type, e.g. `aws_s3_bucket`.
    pub resource: String,
    /// Source attribute holding the import ID, e.g. `bucket`.
    pub attribute: String,
    /// Optional allow-list of source resource names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// A dotted key-path predicate over the source attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Condition {
    /// Dotted path, e.g. `versioning.enabled`. Empty means "always".
    pub key: String,
}

/// Post-processing of the extracted value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValueTransform {
    /// Action name, e.g. `useSuffix`. Empty means "no transform".
    pub action: String,
    /// Action argument.
    pub value: Value,
}

impl ImportPlan {
    /// Returns the number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl ForEachBlock {
    /// Returns true if the resource type or attribute is missing.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.resource.is_empty() || self.attribute.is_empty()
    }

    /// Returns true if the resource name passes the allow-list.
    ///
    /// An empty list allows every name.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        self.values.is_empty() || self.values.iter().any(|v| v == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_default() {
        let plan: ImportPlan =
            serde_json::from_str(r#"{"steps":[{"import_name":"aws_s3_bucket_acl"}]}"#).unwrap();

        assert!(plan.version.is_empty());
        let step = &plan.steps[0];
        assert!(step.for_each.is_incomplete());
        assert!(step.condition.key.is_empty());
        assert!(step.transform.action.is_empty());
        assert_eq!(step.transform.value, Value::Null);
    }

    #[test]
    fn test_allow_list() {
        let open = ForEachBlock::default();
        assert!(open.allows("anything"));

        let restricted = ForEachBlock {
            values: vec![String::from("logs"), String::from("assets")],
            ..ForEachBlock::default()
        };
        assert!(restricted.allows("logs"));
        assert!(!restricted.allows("backups"));
    }
}
