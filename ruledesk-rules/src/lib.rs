//! Condition model for RuleDesk rules.
//!
//! A rule is a sequence of conditions, each addressing a field of an input
//! document through a JSON path. This crate holds the condition tree and its
//! copy-on-write edits, payload validation, fact extraction from sample
//! documents, the per-rule path catalog (template), condition search and an
//! in-memory rule store served over HTTP.

mod condition;
mod describe;
mod edit;
mod editor;
mod error;
mod evaluator;
mod facts;
mod path;
mod rule;
mod search;
mod service;
mod store;
mod template;
mod validate;

pub use condition::{Comparison, Composite, Condition, ConditionType, Membership, Presence};
pub use describe::{describe, label, preview, result_text};
pub use edit::{append_condition, remove_condition, replace_condition};
pub use editor::RuleEditor;
pub use error::RuleError;
pub use evaluator::{CannedEvaluator, RuleEvaluator, TestOutcome};
pub use facts::{extract_facts, extract_facts_at, filter_facts, Fact, FactType};
pub use path::{generate_name_from_path, JsonPath, PathError, PathSegment};
pub use rule::Rule;
pub use search::{matches, matching_indices};
pub use service::{
    ApiResponse, EnabledUpdate, RuleApiBuilder, RuleServiceConfig, TestRuleRequest,
};
pub use store::{RuleStore, StoreSeed};
pub use template::{Template, TemplateEntry, TemplateError};
pub use validate::{
    conditions_from_value, parse_conditions, validate_conditions, validate_value,
    ValidationError,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edits_and_validates_exists_rule() {
        let conditions = append_condition(&[], ConditionType::Exists);
        assert!(matches!(
            validate_conditions(&conditions),
            Err(ValidationError::MissingField { index: 0, field: "path", .. })
        ));

        let mut edited = conditions[0].clone();
        if let Condition::Exists(presence) = &mut edited {
            presence.path = JsonPath::from("$.orderNo");
        }
        let conditions = replace_condition(&conditions, 0, edited).expect("replace");
        validate_conditions(&conditions).expect("valid");

        let encoded = serde_json::to_value(&conditions).expect("encode");
        assert_eq!(encoded[0]["type"], json!("exists"));
        assert_eq!(encoded[0]["path"], json!("$.orderNo"));
        assert_eq!(encoded[0]["successResult"], json!({}));

        let template = Template::from_conditions(&conditions);
        assert_eq!(template.display_name("$.orderNo"), "Order No");
        assert_eq!(describe(&conditions[0], &template), "Result: {} (Condition: Order No exists)");
    }
}
