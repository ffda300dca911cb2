//! Compiled plan steps.
//!
//! Compiling a step parses its template and builds its transform, so every
//! templating mistake in the plan is found before any state is touched.

use serde_json::Value;

use crate::address::ImportTemplate;
use crate::config::{ForEachBlock, ImportStep};
use crate::error::{ConfigError, Result, TfBulkError};
use crate::state::StateResource;

use super::report::SkipReason;
use super::transform::Transform;

/// A plan step ready to run.
#[derive(Debug, Clone)]
pub struct CompiledStep {
    /// Zero-based position in the plan.
    index: usize,
    /// Templates as written, joined for display.
    import_name: String,
    /// Parsed templates, applied to each candidate in order.
    templates: Vec<ImportTemplate>,
    /// Source selector.
    selector: ForEachBlock,
    /// Condition key path (empty means unconditional).
    condition_key: String,
    /// Value transform.
    transform: Transform,
}

impl CompiledStep {
    /// Compiles the step at position `index`.
    ///
    /// # Errors
    ///
    /// Returns a [`TfBulkError::Step`] wrapping the template or transform
    /// error.
    pub fn compile(index: usize, step: &ImportStep) -> Result<Self> {
        let in_step = |e: TfBulkError| e.in_step(index, step.import_name.as_str());

        let template = ImportTemplate::parse(&step.import_name)
            .map_err(|e| in_step(e.into()))?;
        let transform = Transform::try_from(&step.transform)
            .map_err(|e| in_step(e.into()))?;

        Ok(Self {
            index,
            import_name: step.import_name.clone(),
            templates: vec![template],
            selector: step.for_each.clone(),
            condition_key: step.condition.key.clone(),
            transform,
        })
    }

    /// Compiles every step of a plan, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first step's compile error.
    pub fn compile_all(steps: &[ImportStep]) -> Result<Vec<Self>> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| Self::compile(index, step))
            .collect()
    }

    /// Builds a single step that imports every template for each resource
    /// selected by `selector`, with no condition and no transform.
    ///
    /// # Errors
    ///
    /// Returns a [`TfBulkError::Step`] for the first invalid template, or a
    /// configuration error when no template is given.
    pub fn fan_out(selector: ForEachBlock, templates: &[String]) -> Result<Self> {
        if templates.is_empty() {
            return Err(ConfigError::validation(
                "at least one import template is required",
                "templates",
            )
            .into());
        }

        let templates = templates
            .iter()
            .map(|raw| {
                ImportTemplate::parse(raw).map_err(|e| TfBulkError::from(e).in_step(0, raw.as_str()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            index: 0,
            import_name: templates
                .iter()
                .map(ImportTemplate::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            templates,
            selector,
            condition_key: String::new(),
            transform: Transform::Identity,
        })
    }

    /// Position in the plan.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The templates as written.
    #[must_use]
    pub fn import_name(&self) -> &str {
        &self.import_name
    }

    /// The parsed templates.
    #[must_use]
    pub fn templates(&self) -> &[ImportTemplate] {
        &self.templates
    }

    /// The source selector.
    #[must_use]
    pub const fn selector(&self) -> &ForEachBlock {
        &self.selector
    }

    /// The condition key path.
    #[must_use]
    pub fn condition_key(&self) -> &str {
        &self.condition_key
    }

    /// The value transform.
    #[must_use]
    pub const fn transform(&self) -> Transform {
        self.transform
    }

    /// Reads the raw import ID from the selector attribute of `resource`.
    ///
    /// Strings are used as-is; numbers and booleans use their JSON text.
    ///
    /// # Errors
    ///
    /// Returns the skip reason when the attribute is absent or not scalar.
    pub fn source_value(&self, resource: &StateResource) -> std::result::Result<String, SkipReason> {
        let attribute = &self.selector.attribute;

        match resource.attribute(attribute) {
            None => Err(SkipReason::AttributeMissing {
                attribute: attribute.clone(),
            }),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
            Some(other) => Err(SkipReason::UnsupportedAttributeType {
                attribute: attribute.clone(),
                found: json_type(other),
            }),
        }
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
