use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use ruledesk_core::Endpoints;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::evaluator::{RuleEvaluator, TestOutcome};
use crate::template::{Template, TemplateEntry};
use crate::validate::conditions_from_value;
use crate::{Rule, RuleError, RuleStore};

/// Envelope wrapping every response of the rule API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Body of the test-rule call: a document and the conditions to run on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRuleRequest {
    pub input: Value,
    pub definition: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnabledUpdate {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRulesQuery {
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    key: Option<String>,
}

/// Failures carry the envelope without data.
type ApiFailure = (StatusCode, Json<ApiResponse<()>>);

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiFailure>;

#[derive(Clone)]
struct RuleServiceState {
    store: RuleStore,
    evaluator: Arc<dyn RuleEvaluator>,
}

/// Configuration for the rule API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleServiceConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Prefix every route is nested under, matching the client base URL.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_path() -> String {
    "/api".to_string()
}

impl Default for RuleServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            base_path: default_base_path(),
            endpoints: Endpoints::default(),
        }
    }
}

/// Helper used to compose the REST API router.
#[derive(Clone)]
pub struct RuleApiBuilder {
    state: RuleServiceState,
}

impl RuleApiBuilder {
    pub fn new(store: RuleStore, evaluator: Arc<dyn RuleEvaluator>) -> Self {
        Self {
            state: RuleServiceState { store, evaluator },
        }
    }

    pub fn into_router(self, config: &RuleServiceConfig) -> Router {
        let endpoints = &config.endpoints;
        let rules = endpoints.rules.trim_end_matches('/');
        let templates = endpoints.templates.trim_end_matches('/');

        let api = Router::new()
            .route(rules, get(list_rules))
            .route(&format!("{rules}/:rule_id"), get(get_rule).put(put_rule))
            .route(&format!("{rules}/:rule_id/enabled"), patch(set_enabled))
            .route(
                &format!("{rules}/:rule_id/default-payload"),
                get(default_payload),
            )
            .route(
                &format!("{rules}/:rule_id/sample-payload"),
                get(sample_payload),
            )
            .route(
                &format!("{templates}/:rule_id"),
                get(get_template).put(put_template),
            )
            .route(endpoints.test_rule_path(), post(test_rule))
            .with_state(self.state);

        let base_path = config.base_path.trim_end_matches('/');
        let router = if base_path.is_empty() {
            api
        } else {
            Router::new().nest(base_path, api)
        };
        router.route("/health", get(health))
    }

    /// Spawns an HTTP server, returning the bound address and a shutdown
    /// trigger.
    pub async fn serve(
        self,
        config: RuleServiceConfig,
    ) -> anyhow::Result<(SocketAddr, oneshot::Sender<()>)> {
        let (tx, rx) = oneshot::channel();
        let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
        let addr = listener.local_addr()?;
        let app = self.into_router(&config);

        tokio::spawn(async move {
            info!(address = %addr, base_path = %config.base_path, "starting rule service");
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
                .ok();
        });

        Ok((addr, tx))
    }
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_rules(
    State(state): State<RuleServiceState>,
    Query(query): Query<ListRulesQuery>,
) -> ApiResult<Vec<Rule>> {
    let tenant_id = query
        .tenant_id
        .filter(|tenant| !tenant.trim().is_empty())
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "tenantId is required"))?;
    Ok(Json(ApiResponse::ok(
        state.store.list_rules(&tenant_id, query.key.as_deref()),
    )))
}

async fn get_rule(
    State(state): State<RuleServiceState>,
    Path(rule_id): Path<String>,
) -> ApiResult<Rule> {
    state
        .store
        .get_rule(&rule_id)
        .map(|rule| Json(ApiResponse::ok(rule)))
        .ok_or_else(|| rule_error(RuleError::NotFound(rule_id)))
}

async fn put_rule(
    State(state): State<RuleServiceState>,
    Path(rule_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Rule> {
    let mut rule = Rule::from_value(json_body(body)?).map_err(rule_error)?;
    if rule.rule_id.is_empty() {
        rule.rule_id = rule_id.clone();
    }
    if rule.rule_id != rule_id {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "rule identifier mismatch",
        ));
    }

    state
        .store
        .put_rule(rule)
        .map(|rule| Json(ApiResponse::ok(rule)))
        .map_err(rule_error)
}

async fn set_enabled(
    State(state): State<RuleServiceState>,
    Path(rule_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Rule> {
    let update: EnabledUpdate = decode_body(body)?;
    state
        .store
        .set_enabled(&rule_id, update.enabled, update.modified_by)
        .map(|rule| Json(ApiResponse::ok(rule)))
        .map_err(rule_error)
}

async fn get_template(
    State(state): State<RuleServiceState>,
    Path(rule_id): Path<String>,
) -> ApiResult<Template> {
    Ok(Json(ApiResponse::ok(state.store.template(&rule_id))))
}

async fn put_template(
    State(state): State<RuleServiceState>,
    Path(rule_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Template> {
    let entries: Vec<TemplateEntry> = decode_body(body)?;
    state
        .store
        .put_template(&rule_id, entries)
        .map(|template| Json(ApiResponse::ok(template)))
        .map_err(rule_error)
}

async fn default_payload(
    State(state): State<RuleServiceState>,
    Path(rule_id): Path<String>,
) -> ApiResult<Value> {
    state
        .store
        .default_payload(&rule_id)
        .map(|payload| Json(ApiResponse::ok(payload)))
        .ok_or_else(|| rule_error(RuleError::NotFound(rule_id)))
}

async fn sample_payload(
    State(state): State<RuleServiceState>,
    Path(rule_id): Path<String>,
) -> ApiResult<Value> {
    state
        .store
        .sample_payload(&rule_id)
        .map(|payload| Json(ApiResponse::ok(payload)))
        .ok_or_else(|| rule_error(RuleError::NotFound(rule_id)))
}

async fn test_rule(
    State(state): State<RuleServiceState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<TestOutcome> {
    let request: TestRuleRequest = decode_body(body)?;
    let conditions = conditions_from_value(request.definition).map_err(rule_error)?;
    state
        .evaluator
        .evaluate(&request.input, &conditions)
        .await
        .map(|outcome| Json(ApiResponse::ok(outcome)))
        .map_err(rule_error)
}

/// Unwraps a JSON body, answering malformed ones in the envelope.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiFailure> {
    body.map(|Json(value)| value).map_err(|rejection| {
        warn!(status = %rejection.status(), error = %rejection.body_text(), "rejected request body");
        (
            rejection.status(),
            Json(ApiResponse::failure(rejection.body_text())),
        )
    })
}

fn decode_body<B: DeserializeOwned>(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<B, ApiFailure> {
    serde_json::from_value(json_body(body)?).map_err(|err| rule_error(RuleError::from(err)))
}

fn failure(status: StatusCode, message: &str) -> ApiFailure {
    (status, Json(ApiResponse::failure(message)))
}

fn rule_error(err: RuleError) -> ApiFailure {
    let status = match &err {
        RuleError::NotFound(_) => StatusCode::NOT_FOUND,
        RuleError::Evaluation(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    };
    warn!(%status, error = %err, "rule API request failed");
    (status, Json(ApiResponse::failure(err.to_string())))
}
