use std::io;

use thiserror::Error;

/// Result type used across the ruledesk core crate.
pub type Result<T> = std::result::Result<T, RuleDeskError>;

/// Canonical error representation shared by the workspace crates.
#[derive(Debug, Error)]
pub enum RuleDeskError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("general error: {0}")]
    GeneralError(String),
}

impl From<serde_json::Error> for RuleDeskError {
    fn from(err: serde_json::Error) -> Self {
        RuleDeskError::DeserializationError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("endpoint {name} must start with '/': {value}")]
    InvalidEndpoint { name: &'static str, value: String },
}

impl From<ConfigError> for RuleDeskError {
    fn from(value: ConfigError) -> Self {
        RuleDeskError::ConfigError(value.to_string())
    }
}
