use thiserror::Error;

use crate::condition::ConditionType;
use crate::template::TemplateError;
use crate::validate::ValidationError;

/// Errors returned when parsing, editing or storing rule definitions.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to parse conditions: {message}")]
    Parse { message: String },
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{kind} conditions have no children")]
    NotComposite { kind: ConditionType },
    #[error("{kind} conditions have no values list")]
    NotMembership { kind: ConditionType },
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("rule {0} not found")]
    NotFound(String),
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

impl RuleError {
    pub fn parse_error(message: impl Into<String>) -> Self {
        RuleError::Parse {
            message: message.into(),
        }
    }

    pub(crate) fn check_index(index: usize, len: usize) -> Result<(), RuleError> {
        if index < len {
            Ok(())
        } else {
            Err(RuleError::IndexOutOfRange { index, len })
        }
    }
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::parse_error(err.to_string())
    }
}
