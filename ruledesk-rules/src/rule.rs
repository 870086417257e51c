use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;
use crate::error::RuleError;
use crate::validate::{conditions_from_value, validate_conditions, ValidationError};

/// Named, versioned and toggleable sequence of top-level conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique identifier for the rule.
    pub rule_id: String,
    /// Store-assigned revision, bumped on every save.
    #[serde(default = "Rule::default_version")]
    pub version: u32,
    #[serde(default)]
    pub modified_by: Option<String>,
    pub tenant_id: String,
    /// Whether the rule is active.
    #[serde(default = "Rule::default_enabled")]
    pub enabled: bool,
    /// Conditions in evaluation order. Absent on rules that were never edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<Condition>>,
}

impl Rule {
    pub fn new(rule_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            version: Self::default_version(),
            modified_by: None,
            tenant_id: tenant_id.into(),
            enabled: Self::default_enabled(),
            payload: None,
        }
    }

    pub fn default_version() -> u32 {
        1
    }

    pub fn default_enabled() -> bool {
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Conditions of the rule, empty when no payload was ever saved.
    pub fn conditions(&self) -> &[Condition] {
        self.payload.as_deref().unwrap_or_default()
    }

    /// Copy of the rule carrying `payload` wholesale, after validation.
    pub fn with_payload(&self, payload: Vec<Condition>) -> Result<Rule, ValidationError> {
        validate_conditions(&payload)?;
        Ok(Rule {
            payload: Some(payload),
            ..self.clone()
        })
    }

    /// Decodes a rule from raw JSON. The payload goes through the raw
    /// validator first, so fields that typing would drop are rejected.
    pub fn from_value(mut raw: Value) -> Result<Rule, RuleError> {
        let payload = raw
            .as_object_mut()
            .ok_or_else(|| RuleError::parse_error("rule must be a JSON object"))?
            .remove("payload");
        let mut rule: Rule = serde_json::from_value(raw)?;
        rule.payload = match payload {
            None | Some(Value::Null) => None,
            Some(payload) => Some(conditions_from_value(payload)?),
        };
        Ok(rule)
    }

    /// Checks the stored payload, if any.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_conditions(self.conditions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionType;
    use serde_json::json;

    #[test]
    fn decodes_rule_without_payload() {
        let rule: Rule = serde_json::from_value(json!({
            "ruleId": "SHIPPING_RULES",
            "version": 12,
            "modifiedBy": "user1",
            "tenantId": "AJIOB2C",
            "enabled": false
        }))
        .expect("rule");

        assert_eq!(rule.version, 12);
        assert!(!rule.is_enabled());
        assert!(rule.conditions().is_empty());
        assert!(serde_json::to_value(&rule).expect("encode").get("payload").is_none());
    }

    #[test]
    fn replaces_payload_only_when_valid() {
        let rule = Rule::new("PILOT_RULES", "AJIOB2C");
        let invalid = vec![Condition::default_for(ConditionType::Exists, None)];
        assert!(rule.with_payload(invalid).is_err());

        let valid: Vec<Condition> = serde_json::from_value(json!([
            {"type": "exists", "path": "$.orderNo"}
        ]))
        .expect("conditions");
        let updated = rule.with_payload(valid.clone()).expect("valid payload");
        assert_eq!(updated.conditions(), valid.as_slice());
        assert!(rule.payload.is_none());
    }

    #[test]
    fn raw_decoding_rejects_fields_typing_would_drop() {
        let composite_with_path = json!({
            "ruleId": "R",
            "tenantId": "AJIOB2C",
            "payload": [{"type": "and", "children": [], "path": "$.x"}]
        });
        assert!(matches!(
            Rule::from_value(composite_with_path),
            Err(RuleError::Validation(ValidationError::UnexpectedField { index: 0, field: "path", .. }))
        ));

        let leaf_with_children = json!({
            "ruleId": "R",
            "tenantId": "AJIOB2C",
            "payload": [{"type": "equals", "path": "$.a", "value": 1, "children": []}]
        });
        assert!(matches!(
            Rule::from_value(leaf_with_children),
            Err(RuleError::Validation(ValidationError::UnexpectedField { field: "children", .. }))
        ));

        assert!(matches!(Rule::from_value(json!([])), Err(RuleError::Parse { .. })));
        assert!(matches!(
            Rule::from_value(json!({"ruleId": "R"})),
            Err(RuleError::Parse { .. })
        ));

        let rule = Rule::from_value(json!({"ruleId": "R", "tenantId": "T", "payload": null}))
            .expect("no payload");
        assert!(rule.payload.is_none());
    }
}
