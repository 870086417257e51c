use tracing::{debug, warn};

use crate::condition::{Condition, ConditionType};
use crate::edit::{append_condition, remove_condition, replace_condition};
use crate::error::RuleError;
use crate::rule::Rule;
use crate::search::matching_indices;
use crate::validate::parse_conditions;

/// Working copy of one rule's conditions.
///
/// Edits replace the payload with a new vector. Hand-edited JSON is parsed
/// and validated before it replaces anything, so a failed edit leaves the
/// last valid payload in place.
#[derive(Debug, Clone)]
pub struct RuleEditor {
    rule: Rule,
    payload: Vec<Condition>,
}

impl RuleEditor {
    pub fn new(rule: Rule) -> Self {
        let payload = rule.conditions().to_vec();
        Self { rule, payload }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn payload(&self) -> &[Condition] {
        &self.payload
    }

    /// Whether the working payload differs from the rule it was opened on.
    pub fn is_dirty(&self) -> bool {
        self.payload.as_slice() != self.rule.conditions()
    }

    pub fn append(&mut self, kind: ConditionType) {
        self.payload = append_condition(&self.payload, kind);
    }

    pub fn replace(&mut self, index: usize, condition: Condition) -> Result<(), RuleError> {
        self.payload = replace_condition(&self.payload, index, condition)?;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<(), RuleError> {
        self.payload = remove_condition(&self.payload, index)?;
        Ok(())
    }

    pub fn to_json_text(&self) -> Result<String, RuleError> {
        Ok(serde_json::to_string_pretty(&self.payload)?)
    }

    /// Replaces the payload with hand-edited JSON text.
    pub fn apply_json_text(&mut self, text: &str) -> Result<(), RuleError> {
        match parse_conditions(text) {
            Ok(conditions) => {
                debug!(rule_id = %self.rule.rule_id, len = conditions.len(), "applied JSON payload");
                self.payload = conditions;
                Ok(())
            }
            Err(err) => {
                warn!(rule_id = %self.rule.rule_id, error = %err, "rejected JSON payload");
                Err(err)
            }
        }
    }

    pub fn search(&self, text: &str) -> Vec<usize> {
        matching_indices(&self.payload, text)
    }

    /// Validated rule carrying the working payload, ready to be stored.
    pub fn save(&self) -> Result<Rule, RuleError> {
        Ok(self.rule.with_payload(self.payload.clone())?)
    }

    /// Adopts the rule returned by the store after a successful save.
    pub fn commit(&mut self, saved: Rule) {
        self.payload = saved.conditions().to_vec();
        self.rule = saved;
    }
}
