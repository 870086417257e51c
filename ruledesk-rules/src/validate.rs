//! Structural validation of condition trees.
//!
//! Two entry points share one error type: [`validate_value`] checks raw JSON
//! as typed by an operator, [`validate_conditions`] checks an already decoded
//! tree. Both stop at the first violation and never modify their input.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::condition::{Condition, ConditionType};
use crate::error::RuleError;

/// First structural violation found in a condition sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Payload must be an array")]
    NotASequence,
    #[error("Condition at index {index} must be an object")]
    NotAnObject { index: usize },
    #[error("Condition at index {index} is missing 'type' field")]
    MissingType { index: usize },
    #[error("Condition at index {index} has unknown type '{found}'")]
    UnknownType { index: usize, found: String },
    #[error("{kind} condition at index {index} must have '{field}' field")]
    MissingField {
        index: usize,
        kind: ConditionType,
        field: &'static str,
    },
    #[error("{kind} condition at index {index} must have '{field}' array")]
    NotAnArray {
        index: usize,
        kind: ConditionType,
        field: &'static str,
    },
    #[error("{kind} condition at index {index} has invalid '{field}': {reason}")]
    InvalidField {
        index: usize,
        kind: ConditionType,
        field: &'static str,
        reason: String,
    },
    #[error("{kind} condition at index {index} must not carry '{field}'")]
    UnexpectedField {
        index: usize,
        kind: ConditionType,
        field: &'static str,
    },
    #[error("Child condition error: {source}")]
    Child {
        index: usize,
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Index of the offending node in the sequence that was validated. For
    /// nested failures this is the index of the top-level ancestor.
    pub fn index(&self) -> Option<usize> {
        match self {
            ValidationError::NotASequence => None,
            ValidationError::NotAnObject { index }
            | ValidationError::MissingType { index }
            | ValidationError::UnknownType { index, .. }
            | ValidationError::MissingField { index, .. }
            | ValidationError::NotAnArray { index, .. }
            | ValidationError::InvalidField { index, .. }
            | ValidationError::UnexpectedField { index, .. }
            | ValidationError::Child { index, .. } => Some(*index),
        }
    }

    /// Name of the missing or malformed field on the innermost failing node.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingType { .. } | ValidationError::UnknownType { .. } => {
                Some("type")
            }
            ValidationError::MissingField { field, .. }
            | ValidationError::NotAnArray { field, .. }
            | ValidationError::InvalidField { field, .. }
            | ValidationError::UnexpectedField { field, .. } => Some(field),
            ValidationError::Child { source, .. } => source.field(),
            ValidationError::NotASequence | ValidationError::NotAnObject { .. } => None,
        }
    }

    /// Indices from the top-level sequence down to the failing node.
    pub fn location(&self) -> Vec<usize> {
        let mut location = Vec::new();
        let mut current = self;
        loop {
            if let Some(index) = current.index() {
                location.push(index);
            }
            match current {
                ValidationError::Child { source, .. } => current = source,
                _ => return location,
            }
        }
    }

    /// Innermost error, with every child wrapper removed.
    pub fn root_cause(&self) -> &ValidationError {
        match self {
            ValidationError::Child { source, .. } => source.root_cause(),
            other => other,
        }
    }

    fn in_child(self, index: usize) -> Self {
        ValidationError::Child {
            index,
            source: Box::new(self),
        }
    }
}

/// Validates a raw JSON value expected to hold a condition sequence.
pub fn validate_value(value: &Value) -> Result<(), ValidationError> {
    let items = value.as_array().ok_or(ValidationError::NotASequence)?;
    for (index, item) in items.iter().enumerate() {
        validate_raw_condition(index, item)?;
    }
    Ok(())
}

/// Validates a decoded condition tree.
pub fn validate_conditions(conditions: &[Condition]) -> Result<(), ValidationError> {
    for (index, condition) in conditions.iter().enumerate() {
        validate_typed_condition(index, condition)?;
    }
    Ok(())
}

/// Parses hand-edited JSON text into a validated condition sequence.
pub fn parse_conditions(text: &str) -> Result<Vec<Condition>, RuleError> {
    let raw: Value = serde_json::from_str(text)?;
    conditions_from_value(raw)
}

/// Validates and decodes a raw JSON condition sequence.
pub fn conditions_from_value(raw: Value) -> Result<Vec<Condition>, RuleError> {
    validate_value(&raw)?;
    Ok(serde_json::from_value(raw)?)
}

fn validate_raw_condition(index: usize, item: &Value) -> Result<(), ValidationError> {
    let object = item
        .as_object()
        .ok_or(ValidationError::NotAnObject { index })?;

    let kind = match object.get("type") {
        None | Some(Value::Null) => return Err(ValidationError::MissingType { index }),
        Some(Value::String(raw)) if raw.is_empty() => {
            return Err(ValidationError::MissingType { index })
        }
        Some(Value::String(raw)) => {
            raw.parse::<ConditionType>()
                .map_err(|_| ValidationError::UnknownType {
                    index,
                    found: raw.clone(),
                })?
        }
        Some(other) => {
            return Err(ValidationError::UnknownType {
                index,
                found: other.to_string(),
            })
        }
    };

    if kind.is_composite() {
        let children = match object.get("children") {
            None => {
                return Err(ValidationError::MissingField {
                    index,
                    kind,
                    field: "children",
                })
            }
            Some(children) => children,
        };
        if !children.is_array() {
            return Err(ValidationError::NotAnArray {
                index,
                kind,
                field: "children",
            });
        }
        validate_value(children).map_err(|err| err.in_child(index))?;
    } else if kind == ConditionType::Exists {
        require_path(index, kind, object)?;
    } else if kind.is_membership() {
        require_path(index, kind, object)?;
        match object.get("values") {
            None => {
                return Err(ValidationError::MissingField {
                    index,
                    kind,
                    field: "values",
                })
            }
            Some(Value::Array(values)) => {
                if let Some(bad) = values.iter().find(|value| !value.is_string()) {
                    return Err(ValidationError::InvalidField {
                        index,
                        kind,
                        field: "values",
                        reason: format!("expected strings, found {bad}"),
                    });
                }
            }
            Some(_) => {
                return Err(ValidationError::NotAnArray {
                    index,
                    kind,
                    field: "values",
                })
            }
        }
    } else {
        require_path(index, kind, object)?;
        match object.get("value") {
            None => {
                return Err(ValidationError::MissingField {
                    index,
                    kind,
                    field: "value",
                })
            }
            Some(value) => require_scalar(index, kind, value)?,
        }
    }

    check_common_fields(index, kind, object)
}

fn require_path(
    index: usize,
    kind: ConditionType,
    object: &Map<String, Value>,
) -> Result<(), ValidationError> {
    match object.get("path") {
        None | Some(Value::Null) => Err(ValidationError::MissingField {
            index,
            kind,
            field: "path",
        }),
        Some(Value::String(path)) if path.is_empty() => Err(ValidationError::MissingField {
            index,
            kind,
            field: "path",
        }),
        Some(Value::String(_)) => Ok(()),
        Some(other) => Err(ValidationError::InvalidField {
            index,
            kind,
            field: "path",
            reason: format!("expected a string, found {other}"),
        }),
    }
}

fn require_scalar(index: usize, kind: ConditionType, value: &Value) -> Result<(), ValidationError> {
    if value.is_array() || value.is_object() {
        return Err(ValidationError::InvalidField {
            index,
            kind,
            field: "value",
            reason: "expected a scalar".to_string(),
        });
    }
    Ok(())
}

fn check_common_fields(
    index: usize,
    kind: ConditionType,
    object: &Map<String, Value>,
) -> Result<(), ValidationError> {
    match object.get("defaultResult") {
        None | Some(Value::Null) | Some(Value::Bool(_)) => {}
        Some(other) => {
            return Err(ValidationError::InvalidField {
                index,
                kind,
                field: "defaultResult",
                reason: format!("expected a boolean, found {other}"),
            })
        }
    }

    let unexpected = |field: &'static str| ValidationError::UnexpectedField { index, kind, field };
    if kind.is_composite() {
        if object.contains_key("value") {
            return Err(unexpected("value"));
        }
        if object.contains_key("values") {
            return Err(unexpected("values"));
        }
        // Older editors wrote `path: ""` on every new node.
        if matches!(object.get("path"), Some(path) if path.as_str() != Some("")) {
            return Err(unexpected("path"));
        }
    } else if object.contains_key("children") {
        return Err(unexpected("children"));
    }
    Ok(())
}

fn validate_typed_condition(index: usize, condition: &Condition) -> Result<(), ValidationError> {
    let kind = condition.kind();
    match condition {
        Condition::And(composite) | Condition::Or(composite) => {
            validate_conditions(&composite.children).map_err(|err| err.in_child(index))
        }
        Condition::Exists(presence) => non_empty_path(index, kind, presence.path.is_empty()),
        Condition::In(membership)
        | Condition::ContainsAny(membership)
        | Condition::ContainsAll(membership) => {
            non_empty_path(index, kind, membership.path.is_empty())
        }
        Condition::Equals(comparison)
        | Condition::NotEquals(comparison)
        | Condition::GreaterThan(comparison)
        | Condition::LessThan(comparison)
        | Condition::GreaterThanOrEqual(comparison)
        | Condition::LessThanOrEqual(comparison) => {
            non_empty_path(index, kind, comparison.path.is_empty())?;
            require_scalar(index, kind, &comparison.value)
        }
    }
}

fn non_empty_path(index: usize, kind: ConditionType, empty: bool) -> Result<(), ValidationError> {
    if empty {
        Err(ValidationError::MissingField {
            index,
            kind,
            field: "path",
        })
    } else {
        Ok(())
    }
}
