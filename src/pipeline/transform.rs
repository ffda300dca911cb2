//! Value transforms.
//!
//! A transform post-processes the attribute value extracted from a source
//! resource before it is used as the import ID. New actions are added as new
//! [`Transform`] variants.

use serde_json::Value;

use crate::config::ValueTransform;
use crate::error::TransformError;

/// Name of the suffix action in plan files.
pub const USE_SUFFIX: &str = "useSuffix";

/// Every action name accepted in plan files.
pub const SUPPORTED_ACTIONS: &[&str] = &[USE_SUFFIX];

/// A compiled value transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    /// Pass the value through unchanged.
    #[default]
    Identity,
    /// Keep the last `n` characters of the value.
    UseSuffix(usize),
}

impl Transform {
    /// Builds a transform from an action name and its value.
    ///
    /// An empty action yields [`Transform::Identity`].
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Unsupported`] for unknown actions and
    /// [`TransformError::InvalidSpec`] when the value does not fit the action.
    pub fn from_spec(action: &str, spec: &Value) -> Result<Self, TransformError> {
        match action {
            "" => Ok(Self::Identity),
            USE_SUFFIX => suffix_length(spec).map(Self::UseSuffix),
            other => Err(TransformError::Unsupported {
                action: other.to_string(),
                choices: SUPPORTED_ACTIONS.join(", "),
            }),
        }
    }

    /// Applies the transform to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::InvalidSpec`] when a suffix longer than the
    /// value is requested.
    pub fn apply(&self, value: &str) -> Result<String, TransformError> {
        match *self {
            Self::Identity => Ok(value.to_string()),
            Self::UseSuffix(n) => {
                let len = value.chars().count();
                if n > len {
                    return Err(TransformError::invalid_spec(
                        USE_SUFFIX,
                        format!("suffix of {n} characters requested but `{value}` has only {len}"),
                    ));
                }
                Ok(value.chars().skip(len - n).collect())
            }
        }
    }
}

impl TryFrom<&ValueTransform> for Transform {
    type Error = TransformError;

    fn try_from(config: &ValueTransform) -> Result<Self, Self::Error> {
        Self::from_spec(&config.action, &config.value)
    }
}

/// Transforms `raw_value` with the given action and spec in one call.
///
/// # Errors
///
/// Returns an error if the action is unknown, the spec is invalid, or the
/// transform cannot be applied to the value.
pub fn transform(action: &str, spec: &Value, raw_value: &str) -> Result<String, TransformError> {
    Transform::from_spec(action, spec)?.apply(raw_value)
}

/// Reads a positive, integral suffix length. `6` and `6.0` are both accepted.
fn suffix_length(spec: &Value) -> Result<usize, TransformError> {
    let invalid = |reason: String| TransformError::invalid_spec(USE_SUFFIX, reason);

    let Value::Number(number) = spec else {
        return Err(invalid(format!("expected an integer, got `{spec}`")));
    };

    let length = number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX.into())
            .map(|f| f as u64)
    });

    match length.map(usize::try_from) {
        Some(Ok(0)) => Err(invalid(String::from("suffix length must be at least 1"))),
        Some(Ok(n)) => Ok(n),
        _ => Err(invalid(format!("expected a positive integer, got `{number}`"))),
    }
}
