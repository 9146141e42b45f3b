use thiserror::Error;

use crate::validation::ValidationResult;

/// Error code for requests that broke one or more field rules.
pub const INVALID_MODEL: &str = "invalid_model";
/// Error code for failures of the validation machinery itself.
pub const VALIDATION_ERROR: &str = "validation_error";

/// Outcome of a single rule evaluation that did not pass.
///
/// Only `Violation` is a client input problem. The other variants mean the
/// rule was wired up wrongly and are surfaced as configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("{0}")]
    Violation(String),

    #[error("invalid parameter {parameter:?} for rule '{rule}'")]
    BadParameter { rule: String, parameter: String },

    #[error("rule '{rule}' cannot be applied to {kind} values")]
    Unsupported { rule: String, kind: &'static str },
}

impl RuleError {
    pub fn violation(message: impl Into<String>) -> Self {
        RuleError::Violation(message.into())
    }

    pub fn bad_parameter(rule: impl Into<String>, parameter: impl Into<String>) -> Self {
        RuleError::BadParameter {
            rule: rule.into(),
            parameter: parameter.into(),
        }
    }

    pub fn unsupported(rule: impl Into<String>, kind: &'static str) -> Self {
        RuleError::Unsupported {
            rule: rule.into(),
            kind,
        }
    }
}

/// Dispatch aborted before a result could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no rule registered under '{rule}' (field '{field}')")]
    UnknownRule { field: String, rule: String },

    #[error("field '{field}': {source}")]
    Misconfigured {
        field: String,
        #[source]
        source: RuleError,
    },
}

/// Domain-level error handed to the transport boundary.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("validation failed for {} field(s)", .0.len())]
    InvalidModel(ValidationResult),

    #[error("{0}")]
    Internal(String),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidModel(_) => INVALID_MODEL,
            ValidationError::Internal(_) => VALIDATION_ERROR,
        }
    }

    /// Field map for `invalid_model`; internal errors carry none.
    pub fn details(&self) -> Option<&ValidationResult> {
        match self {
            ValidationError::InvalidModel(result) => Some(result),
            ValidationError::Internal(_) => None,
        }
    }
}

impl From<DispatchError> for ValidationError {
    fn from(err: DispatchError) -> Self {
        ValidationError::Internal(err.to_string())
    }
}

impl From<ValidationResult> for ValidationError {
    fn from(result: ValidationResult) -> Self {
        ValidationError::InvalidModel(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let mut result = ValidationResult::new();
        result.push("name", "required field");

        let invalid = ValidationError::from(result);
        assert_eq!(invalid.code(), "invalid_model");
        assert_eq!(invalid.details().map(|d| d.len()), Some(1));
        assert_eq!(invalid.to_string(), "validation failed for 1 field(s)");

        let internal = ValidationError::from(DispatchError::UnknownRule {
            field: "name".to_string(),
            rule: "nope".to_string(),
        });
        assert_eq!(internal.code(), "validation_error");
        assert!(internal.details().is_none());
        assert!(internal.to_string().contains("'nope'"));
    }

    #[test]
    fn test_misconfigured_message() {
        let err = DispatchError::Misconfigured {
            field: "size".to_string(),
            source: RuleError::bad_parameter("maxlen", "ten"),
        };
        assert_eq!(
            err.to_string(),
            "field 'size': invalid parameter \"ten\" for rule 'maxlen'"
        );
    }
}
