use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::template::{Template, TemplateEntry};
use crate::{Rule, RuleError};

/// Initial content for a [`RuleStore`], typically read from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSeed {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub templates: HashMap<String, Vec<TemplateEntry>>,
    #[serde(default)]
    pub default_payloads: HashMap<String, Value>,
    #[serde(default)]
    pub sample_payloads: HashMap<String, Value>,
}

#[derive(Default)]
struct StoreState {
    rules: BTreeMap<String, Rule>,
    templates: HashMap<String, Template>,
    default_payloads: HashMap<String, Value>,
    sample_payloads: HashMap<String, Value>,
}

/// In-memory rule store. Rules and templates are replaced wholesale.
#[derive(Default, Clone)]
pub struct RuleStore {
    inner: Arc<RwLock<StoreState>>,
}

impl RuleStore {
    /// Creates a new empty rule store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from seed data, validating every rule and template.
    pub fn from_seed(seed: StoreSeed) -> Result<Self, RuleError> {
        let store = Self::new();
        for rule in seed.rules {
            rule.validate()?;
            store.inner.write().rules.insert(rule.rule_id.clone(), rule);
        }
        for (rule_id, entries) in seed.templates {
            store.put_template(&rule_id, entries)?;
        }
        {
            let mut inner = store.inner.write();
            inner.default_payloads = seed.default_payloads;
            inner.sample_payloads = seed.sample_payloads;
        }
        Ok(store)
    }

    /// Rules of a tenant, ordered by id. `key` narrows the list to ids
    /// containing it, ignoring case.
    pub fn list_rules(&self, tenant_id: &str, key: Option<&str>) -> Vec<Rule> {
        let needle = key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_lowercase);
        let inner = self.inner.read();
        inner
            .rules
            .values()
            .filter(|rule| rule.tenant_id == tenant_id)
            .filter(|rule| match &needle {
                Some(needle) => rule.rule_id.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect()
    }

    pub fn get_rule(&self, rule_id: &str) -> Option<Rule> {
        self.inner.read().rules.get(rule_id).cloned()
    }

    /// Replaces (or creates) a rule. The stored version is one past the
    /// previous one; new rules keep the version they were sent with.
    pub fn put_rule(&self, mut rule: Rule) -> Result<Rule, RuleError> {
        rule.validate()?;

        if rule.rule_id.trim().is_empty() {
            rule.rule_id = format!("rule-{}", Uuid::new_v4());
        }

        let mut inner = self.inner.write();
        rule.version = match inner.rules.get(&rule.rule_id) {
            Some(previous) => previous.version + 1,
            None => rule.version.max(1),
        };
        debug!(rule_id = %rule.rule_id, version = rule.version, "stored rule");
        inner.rules.insert(rule.rule_id.clone(), rule.clone());
        Ok(rule)
    }

    /// Flips the `enabled` flag, recording a new version when it changes.
    pub fn set_enabled(
        &self,
        rule_id: &str,
        enabled: bool,
        modified_by: Option<String>,
    ) -> Result<Rule, RuleError> {
        let mut inner = self.inner.write();
        let rule = inner
            .rules
            .get_mut(rule_id)
            .ok_or_else(|| RuleError::NotFound(rule_id.to_string()))?;

        if rule.enabled != enabled {
            rule.enabled = enabled;
            rule.version += 1;
            if modified_by.is_some() {
                rule.modified_by = modified_by;
            }
            debug!(rule_id, enabled, version = rule.version, "toggled rule");
        }
        Ok(rule.clone())
    }

    /// Template of a rule; empty when none was saved.
    pub fn template(&self, rule_id: &str) -> Template {
        self.inner
            .read()
            .templates
            .get(rule_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn put_template(
        &self,
        rule_id: &str,
        entries: Vec<TemplateEntry>,
    ) -> Result<Template, RuleError> {
        let template = Template::from_entries(entries)?;
        self.inner
            .write()
            .templates
            .insert(rule_id.to_string(), template.clone());
        Ok(template)
    }

    pub fn default_payload(&self, rule_id: &str) -> Option<Value> {
        self.inner.read().default_payloads.get(rule_id).cloned()
    }

    pub fn sample_payload(&self, rule_id: &str) -> Option<Value> {
        self.inner.read().sample_payloads.get(rule_id).cloned()
    }

    pub fn set_default_payload(&self, rule_id: &str, payload: Value) {
        self.inner
            .write()
            .default_payloads
            .insert(rule_id.to_string(), payload);
    }

    pub fn set_sample_payload(&self, rule_id: &str, payload: Value) {
        self.inner
            .write()
            .sample_payloads
            .insert(rule_id.to_string(), payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateError;
    use crate::validate::parse_conditions;
    use serde_json::json;

    fn sample_rule(id: &str, tenant: &str) -> Rule {
        let mut rule = Rule::new(id, tenant);
        rule.payload = Some(
            parse_conditions(r#"[{"type": "exists", "path": "$.orderNo"}]"#).expect("payload"),
        );
        rule
    }

    #[test]
    fn versioning_is_tracked() {
        let store = RuleStore::new();
        let mut first = sample_rule("PILOT_RULES", "AJIOB2C");
        first.version = 47;
        let stored = store.put_rule(first).expect("put");
        assert_eq!(stored.version, 47);

        let mut updated = stored.clone();
        updated.modified_by = Some("anubhav.saxena".into());
        let stored = store.put_rule(updated).expect("put");
        assert_eq!(stored.version, 48);
        assert_eq!(
            store.get_rule("PILOT_RULES").and_then(|rule| rule.modified_by),
            Some("anubhav.saxena".to_string())
        );
    }

    #[test]
    fn rejects_invalid_payload_and_keeps_previous() {
        let store = RuleStore::new();
        store.put_rule(sample_rule("PILOT_RULES", "AJIOB2C")).expect("put");

        let mut broken = sample_rule("PILOT_RULES", "AJIOB2C");
        broken.payload = Some(vec![crate::Condition::default_child()]);
        assert!(matches!(store.put_rule(broken), Err(RuleError::Validation(_))));
        assert_eq!(
            store.get_rule("PILOT_RULES").map(|rule| rule.version),
            Some(1)
        );
    }

    #[test]
    fn lists_by_tenant_and_key() {
        let store = RuleStore::new();
        store.put_rule(sample_rule("PILOT_RULES", "AJIOB2C")).expect("put");
        store.put_rule(sample_rule("SHIPPING_RULES", "AJIOB2C")).expect("put");
        store.put_rule(sample_rule("OTHER", "TENANT2")).expect("put");

        let ids = |rules: Vec<Rule>| rules.into_iter().map(|r| r.rule_id).collect::<Vec<_>>();
        assert_eq!(
            ids(store.list_rules("AJIOB2C", None)),
            vec!["PILOT_RULES", "SHIPPING_RULES"]
        );
        assert_eq!(ids(store.list_rules("AJIOB2C", Some("ship"))), vec!["SHIPPING_RULES"]);
        assert_eq!(ids(store.list_rules("AJIOB2C", Some(" "))).len(), 2);
    }

    #[test]
    fn toggling_records_new_version() {
        let store = RuleStore::new();
        store.put_rule(sample_rule("PILOT_RULES", "AJIOB2C")).expect("put");

        let disabled = store
            .set_enabled("PILOT_RULES", false, Some("system".into()))
            .expect("disable");
        assert!(!disabled.enabled);
        assert_eq!(disabled.version, 2);

        let again = store.set_enabled("PILOT_RULES", false, None).expect("noop");
        assert_eq!(again.version, 2);
        assert!(matches!(
            store.set_enabled("MISSING", true, None),
            Err(RuleError::NotFound(_))
        ));
    }

    #[test]
    fn blank_ids_are_generated() {
        let store = RuleStore::new();
        let stored = store.put_rule(sample_rule(" ", "AJIOB2C")).expect("put");
        assert!(stored.rule_id.starts_with("rule-"));
    }

    #[test]
    fn templates_reject_duplicate_paths() {
        let store = RuleStore::new();
        let err = store
            .put_template(
                "PILOT_RULES",
                vec![
                    TemplateEntry::new("$.orderNo", "Order No"),
                    TemplateEntry::new("$.orderNo", "Again"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, RuleError::Template(TemplateError::DuplicatePath(_))));
        assert!(store.template("PILOT_RULES").is_empty());
    }

    #[test]
    fn seeds_payloads() {
        let seed: StoreSeed = serde_json::from_value(json!({
            "rules": [{"ruleId": "PILOT_RULES", "tenantId": "AJIOB2C"}],
            "templates": {"PILOT_RULES": [{"path": "$.orderNo", "name": "Order No"}]},
            "samplePayloads": {"PILOT_RULES": {"orderNum": "FN7390702204"}}
        }))
        .expect("seed");

        let store = RuleStore::from_seed(seed).expect("store");
        assert_eq!(store.template("PILOT_RULES").len(), 1);
        assert_eq!(
            store.sample_payload("PILOT_RULES"),
            Some(json!({"orderNum": "FN7390702204"}))
        );
        assert!(store.default_payload("PILOT_RULES").is_none());
    }
}
