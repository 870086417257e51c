//! Typed HTTP client for the rule store and the evaluation service.

use async_trait::async_trait;
use ruledesk_core::{ApiConfig, Endpoints};
use ruledesk_rules::{
    ApiResponse, Condition, EnabledUpdate, Rule, RuleError, RuleEvaluator, Template,
    TemplateEntry, TestOutcome, TestRuleRequest,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Client bound to one API base URL and its endpoint paths.
#[derive(Clone)]
pub struct RuleStoreClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl RuleStoreClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        Url::parse(&config.base_url).map_err(|err| ClientError::InvalidUrl {
            url: config.base_url.clone(),
            source: err,
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            config: config.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoints(&self) -> &Endpoints {
        &self.config.endpoints
    }

    /// Rules of a tenant, optionally narrowed by `key`.
    pub async fn list_rules(
        &self,
        tenant_id: &str,
        key: Option<&str>,
    ) -> Result<Vec<Rule>, ClientError> {
        let mut url = self.endpoint_url(&self.endpoints().rules, &[])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("tenantId", tenant_id);
            if let Some(key) = key {
                query.append_pair("key", key);
            }
        }
        self.send(self.http.get(url)).await
    }

    pub async fn get_rule(&self, rule_id: &str) -> Result<Rule, ClientError> {
        let url = self.endpoint_url(&self.endpoints().rules, &[rule_id])?;
        self.send(self.http.get(url)).await
    }

    /// Stores the rule wholesale and returns it as persisted.
    pub async fn save_rule(&self, rule: &Rule) -> Result<Rule, ClientError> {
        let url = self.endpoint_url(&self.endpoints().rules, &[&rule.rule_id])?;
        self.send(self.http.put(url).json(rule)).await
    }

    pub async fn set_enabled(
        &self,
        rule_id: &str,
        enabled: bool,
        modified_by: Option<String>,
    ) -> Result<Rule, ClientError> {
        let url = self.endpoint_url(&self.endpoints().rules, &[rule_id, "enabled"])?;
        let body = EnabledUpdate {
            enabled,
            modified_by,
        };
        self.send(self.http.patch(url).json(&body)).await
    }

    pub async fn default_payload(&self, rule_id: &str) -> Result<Value, ClientError> {
        let url = self.endpoint_url(&self.endpoints().rules, &[rule_id, "default-payload"])?;
        self.send(self.http.get(url)).await
    }

    pub async fn sample_payload(&self, rule_id: &str) -> Result<Value, ClientError> {
        let url = self.endpoint_url(&self.endpoints().rules, &[rule_id, "sample-payload"])?;
        self.send(self.http.get(url)).await
    }

    pub async fn get_template(&self, rule_id: &str) -> Result<Template, ClientError> {
        let url = self.endpoint_url(&self.endpoints().templates, &[rule_id])?;
        self.send(self.http.get(url)).await
    }

    pub async fn save_template(
        &self,
        rule_id: &str,
        entries: &[TemplateEntry],
    ) -> Result<Template, ClientError> {
        let url = self.endpoint_url(&self.endpoints().templates, &[rule_id])?;
        self.send(self.http.put(url).json(entries)).await
    }

    /// Runs `definition` against `input` on the evaluation service.
    pub async fn test_rule(
        &self,
        input: &Value,
        definition: &[Condition],
    ) -> Result<TestOutcome, ClientError> {
        let url = self.endpoint_url(&self.endpoints().test_rule, &[])?;
        let definition =
            serde_json::to_value(definition).map_err(|err| ClientError::Decode(err.to_string()))?;
        let body = TestRuleRequest {
            input: input.clone(),
            definition,
        };
        self.send(self.http.post(url).json(&body)).await
    }

    fn endpoint_url(&self, endpoint: &str, segments: &[&str]) -> Result<Url, ClientError> {
        let raw = self.config.url_for(endpoint);
        let mut url = Url::parse(&raw).map_err(|err| ClientError::InvalidUrl {
            url: raw.clone(),
            source: err,
        })?;
        if !segments.is_empty() {
            let mut path = url.path_segments_mut().map_err(|_| ClientError::InvalidUrl {
                url: raw.clone(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|err| ClientError::Http(err.to_string()))?;
        let status = response.status();
        debug!(%status, url = %response.url(), "rule API response");

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ClientError::Http(err.to_string()))?;
        let envelope = serde_json::from_slice::<ApiResponse<T>>(&bytes);

        if !status.is_success() {
            return match envelope {
                Ok(ApiResponse {
                    message: Some(message),
                    ..
                }) => Err(ClientError::Rejected { message }),
                _ => Err(ClientError::UnexpectedStatus { status }),
            };
        }

        let envelope = envelope.map_err(|err| ClientError::Decode(err.to_string()))?;
        unwrap_envelope(envelope)
    }
}

fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, ClientError> {
    if !envelope.success {
        return Err(ClientError::Rejected {
            message: envelope
                .message
                .unwrap_or_else(|| "request was rejected".to_string()),
        });
    }
    envelope
        .data
        .ok_or_else(|| ClientError::Decode("response carried no data".to_string()))
}

#[async_trait]
impl RuleEvaluator for RuleStoreClient {
    async fn evaluate(
        &self,
        input: &Value,
        conditions: &[Condition],
    ) -> Result<TestOutcome, RuleError> {
        self.test_rule(input, conditions)
            .await
            .map_err(|err| RuleError::Evaluation(err.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid rule API url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("rule API request failed: {0}")]
    Http(String),
    #[error("rule API returned unexpected status {status}")]
    UnexpectedStatus { status: reqwest::StatusCode },
    #[error("failed to decode rule API response: {0}")]
    Decode(String),
    #[error("{message}")]
    Rejected { message: String },
}
