//! Step conditions.
//!
//! A condition is a dotted key path into a resource's attribute values. The
//! candidate passes when the value found there is "truthy" for its JSON type.

use serde_json::{Map, Value};
use tracing::warn;

use crate::state::StateResource;

/// Outcome of evaluating a condition against one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOutcome {
    /// No condition configured.
    Unconditional,
    /// The value at the key path is truthy.
    Passed,
    /// The value at the key path is falsy.
    Failed,
    /// The key path does not exist in the attributes.
    Missing,
    /// The value at the key path has a type that cannot be tested.
    Unsupported {
        /// JSON type that was found.
        found: &'static str,
    },
}

impl ConditionOutcome {
    /// Returns true if the candidate should be imported.
    #[must_use]
    pub const fn is_met(&self) -> bool {
        matches!(self, Self::Unconditional | Self::Passed)
    }
}

/// Evaluates `key_path` against `resource`, logging a diagnostic when the
/// path is missing or has an unsupported type.
#[must_use]
pub fn check(key_path: &str, resource: &StateResource) -> bool {
    let outcome = evaluate(key_path, resource);

    match &outcome {
        ConditionOutcome::Missing => {
            warn!("Missing condition key: {}, for resource: {}", key_path, resource.address);
        }
        ConditionOutcome::Unsupported { found } => {
            warn!(
                "Condition key {} of resource {} must be of type list, bool or string, got: {}",
                key_path, resource.address, found
            );
        }
        _ => {}
    }

    outcome.is_met()
}

/// Evaluates `key_path` against `resource` without logging.
#[must_use]
pub fn evaluate(key_path: &str, resource: &StateResource) -> ConditionOutcome {
    if key_path.is_empty() {
        return ConditionOutcome::Unconditional;
    }

    let Some(value) = lookup(&resource.attribute_values, key_path) else {
        return ConditionOutcome::Missing;
    };

    let truthy = match value {
        Value::String(s) => !s.is_empty(),
        Value::Bool(b) => *b,
        Value::Array(items) => !items.is_empty(),
        Value::Null => false,
        Value::Number(_) => return ConditionOutcome::Unsupported { found: "number" },
        Value::Object(_) => return ConditionOutcome::Unsupported { found: "object" },
    };

    if truthy {
        ConditionOutcome::Passed
    } else {
        ConditionOutcome::Failed
    }
}

/// Follows a dotted path; array elements are addressed as `0` or `[0]`.
fn lookup<'v>(attributes: &'v Map<String, Value>, key_path: &str) -> Option<&'v Value> {
    let mut keys = key_path.split('.');
    let first = attributes.get(keys.next()?)?;

    keys.try_fold(first, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => array_position(key).and_then(|i| items.get(i)),
        _ => None,
    })
}

fn array_position(key: &str) -> Option<usize> {
    key.strip_prefix('[')
        .and_then(|k| k.strip_suffix(']'))
        .unwrap_or(key)
        .parse()
        .ok()
}
