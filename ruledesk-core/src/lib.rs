//! Core shared library for the ruledesk workspace.
//!
//! This crate exposes the primitives every other crate depends on:
//! endpoint configuration, the common error type, logging setup and
//! JSON helpers with canonical error mapping.

pub mod config;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use config::{ApiConfig, Endpoints, Environment};
pub use errors::{ConfigError, Result as CoreResult, RuleDeskError};
