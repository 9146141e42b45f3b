//! Validation dispatcher
//!
//! Request types describe their fields through [`Annotated`]: each
//! [`FieldAnnotation`] pairs a field name, a borrowed view of the value and the
//! rules that apply to it. The [`Validator`] resolves every rule against its
//! [`RuleRegistry`] and collects failures into a [`ValidationResult`].
//!
//! ```ignore
//! impl Annotated for CreateWidget {
//!     fn annotations(&self) -> Vec<FieldAnnotation<'_>> {
//!         vec![
//!             FieldAnnotation::new("name", &self.name, "required,maxlen=50"),
//!             FieldAnnotation::new("contact", &self.contact, "email"),
//!         ]
//!     }
//! }
//!
//! let validator = Validator::default();
//! validator.check(&request)?;
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, RuleError, ValidationError};
use crate::rules::{FieldValue, RuleDescriptor, RuleRegistry};

/// A single field-level failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
}

impl FieldFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Field name to failure messages, in first-encountered field order.
///
/// An empty result means the request is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationResult(IndexMap<String, Vec<String>>);

impl ValidationResult {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Append a message to the field's list.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Replace whatever the field held with a single message.
    pub fn set(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), vec![message.into()]);
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Flattened failures, grouped by field.
    pub fn failures(&self) -> Vec<FieldFailure> {
        self.iter()
            .flat_map(|(field, messages)| {
                messages
                    .iter()
                    .map(move |message| FieldFailure::new(field, message.as_str()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(())` when empty, otherwise an `invalid_model` error.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::InvalidModel(self))
        }
    }
}

impl From<Vec<FieldFailure>> for ValidationResult {
    fn from(failures: Vec<FieldFailure>) -> Self {
        let mut result = Self::new();
        for failure in failures {
            result.push(failure.field, failure.message);
        }
        result
    }
}

/// Rules attached to one field of a request.
#[derive(Debug, Clone)]
pub struct FieldAnnotation<'a> {
    pub field: &'static str,
    pub value: FieldValue<'a>,
    pub rules: Vec<RuleDescriptor>,
}

impl<'a> FieldAnnotation<'a> {
    /// Annotate a field with a rule tag such as `"required,maxlen=50"`.
    pub fn new(field: &'static str, value: impl Into<FieldValue<'a>>, tag: &str) -> Self {
        Self::with_rules(field, value, RuleDescriptor::parse_tag(tag))
    }

    pub fn with_rules(
        field: &'static str,
        value: impl Into<FieldValue<'a>>,
        rules: Vec<RuleDescriptor>,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            rules,
        }
    }
}

/// Implemented by request types that can be validated.
pub trait Annotated {
    /// Normalize the data in place before validation (trim, etc.)
    fn sanitize(&mut self) {}

    /// Fields and their rules, in declaration order.
    fn annotations(&self) -> Vec<FieldAnnotation<'_>>;
}

/// Runs annotated requests through a shared, immutable rule registry.
#[derive(Debug, Clone)]
pub struct Validator {
    registry: Arc<RuleRegistry>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Arc::new(RuleRegistry::default()))
    }
}

impl Validator {
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn validate<T: Annotated + ?Sized>(
        &self,
        request: &T,
    ) -> Result<ValidationResult, DispatchError> {
        self.dispatch(request.annotations())
    }

    /// Evaluate every rule of every annotation; no short-circuit on failure.
    ///
    /// An unknown rule name or a misconfigured rule aborts the whole dispatch.
    pub fn dispatch(
        &self,
        annotations: Vec<FieldAnnotation<'_>>,
    ) -> Result<ValidationResult, DispatchError> {
        let mut result = ValidationResult::new();

        for annotation in &annotations {
            for descriptor in &annotation.rules {
                let rule = self.registry.resolve(&descriptor.name).ok_or_else(|| {
                    tracing::warn!(
                        field = annotation.field,
                        rule = %descriptor.name,
                        "validation rule is not registered"
                    );
                    DispatchError::UnknownRule {
                        field: annotation.field.to_string(),
                        rule: descriptor.name.clone(),
                    }
                })?;

                match rule(&annotation.value, &descriptor.parameter) {
                    Ok(()) => {}
                    Err(RuleError::Violation(message)) => {
                        tracing::debug!(
                            field = annotation.field,
                            rule = %descriptor,
                            %message,
                            "field failed validation"
                        );
                        result.push(annotation.field, message);
                    }
                    Err(source) => {
                        tracing::warn!(
                            field = annotation.field,
                            rule = %descriptor,
                            error = %source,
                            "validation rule misconfigured"
                        );
                        return Err(DispatchError::Misconfigured {
                            field: annotation.field.to_string(),
                            source,
                        });
                    }
                }
            }
        }

        Ok(result)
    }

    /// Validate and fold the outcome into the domain error contract.
    pub fn check<T: Annotated + ?Sized>(&self, request: &T) -> Result<(), ValidationError> {
        self.validate(request)?.into_result()
    }
}
