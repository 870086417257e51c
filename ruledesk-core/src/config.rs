use std::env;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::errors::{ConfigError, RuleDeskError};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_RULES_ENDPOINT: &str = "/rules";
pub const DEFAULT_TEMPLATES_ENDPOINT: &str = "/templates";
pub const DEFAULT_TEST_RULE_ENDPOINT: &str = "/gateway/json-definition/try?type=rules";

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Named endpoint paths, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub rules: String,
    pub templates: String,
    /// May carry a query string (`/try?type=rules`).
    pub test_rule: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES_ENDPOINT.to_string(),
            templates: DEFAULT_TEMPLATES_ENDPOINT.to_string(),
            test_rule: DEFAULT_TEST_RULE_ENDPOINT.to_string(),
        }
    }
}

impl Endpoints {
    /// Path portion of the test-rule endpoint, without its query string.
    pub fn test_rule_path(&self) -> &str {
        self.test_rule
            .split_once('?')
            .map(|(path, _)| path)
            .unwrap_or(&self.test_rule)
    }
}

/// Configuration handed to whatever talks to the rule store and the
/// evaluation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub endpoints: Endpoints,
    pub environment: Environment,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            endpoints: Endpoints::default(),
            environment: Environment::default(),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the process environment (`RULEDESK_*`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix("RULEDESK_")
    }

    /// Loads configuration from env vars prefixed with the provided value.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);
        let defaults = Endpoints::default();

        let base_url =
            env::var(key("API_BASE_URL")).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let rules = env::var(key("RULES_ENDPOINT")).unwrap_or(defaults.rules);
        let templates = env::var(key("TEMPLATES_ENDPOINT")).unwrap_or(defaults.templates);
        let test_rule = env::var(key("TEST_RULE_ENDPOINT")).unwrap_or(defaults.test_rule);
        let environment = env::var(key("ENV"))
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();

        let config = Self {
            base_url,
            endpoints: Endpoints {
                rules,
                templates,
                test_rule,
            },
            environment,
        };
        config.validate()?;
        debug!(base_url = %config.base_url, environment = ?config.environment, "loaded API configuration");
        Ok(config)
    }

    /// Checks that the base URL parses and every endpoint is rooted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url).map_err(|err| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: err.to_string(),
        })?;

        for (name, endpoint) in [
            ("rules", &self.endpoints.rules),
            ("templates", &self.endpoints.templates),
            ("test_rule", &self.endpoints.test_rule),
        ] {
            if !endpoint.starts_with('/') {
                return Err(ConfigError::InvalidEndpoint {
                    name,
                    value: endpoint.clone(),
                });
            }
        }
        Ok(())
    }

    /// Absolute URL string for an endpoint path.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

/// Helper that loads config and converts to the canonical error type.
pub fn load_api_config() -> Result<ApiConfig, RuleDeskError> {
    Ok(ApiConfig::from_env()?)
}
