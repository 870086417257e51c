use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;
use crate::error::RuleError;

/// What the evaluation service reports for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rules: Option<Vec<String>>,
}

/// Capability that runs a condition sequence against a document.
///
/// How `and`/`or` and `defaultResult` combine is up to the implementation;
/// this workspace only ever forwards to one.
#[async_trait]
pub trait RuleEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        input: &Value,
        conditions: &[Condition],
    ) -> Result<TestOutcome, RuleError>;
}

/// Evaluator that answers every request with the same outcome. Useful when
/// running the local store without an evaluation backend.
#[derive(Debug, Clone)]
pub struct CannedEvaluator {
    outcome: TestOutcome,
}

impl CannedEvaluator {
    pub fn new(outcome: TestOutcome) -> Self {
        Self { outcome }
    }
}

impl Default for CannedEvaluator {
    fn default() -> Self {
        Self::new(TestOutcome {
            result: false,
            output: None,
            matched_rules: Some(Vec::new()),
        })
    }
}

#[async_trait]
impl RuleEvaluator for CannedEvaluator {
    async fn evaluate(
        &self,
        _input: &Value,
        _conditions: &[Condition],
    ) -> Result<TestOutcome, RuleError> {
        Ok(self.outcome.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn canned_evaluator_repeats_outcome() {
        let outcome = TestOutcome {
            result: true,
            output: Some(json!({"fulfillment": true, "custom": "V0028"})),
            matched_rules: Some(vec!["exists".into(), "or".into()]),
        };
        let evaluator = CannedEvaluator::new(outcome.clone());
        let got = evaluator
            .evaluate(&json!({"orderNo": "X"}), &[])
            .await
            .expect("evaluate");
        assert_eq!(got, outcome);
    }

    #[test]
    fn outcome_uses_camel_case() {
        let decoded: TestOutcome =
            serde_json::from_value(json!({"result": true, "matchedRules": ["exists"]}))
                .expect("decode");
        assert_eq!(decoded.matched_rules, Some(vec!["exists".to_string()]));
        assert!(decoded.output.is_none());
    }
}
