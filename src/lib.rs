//! RuleDesk: editing, validation and testing of rule conditions.
//!
//! The workspace is split into crates:
//!
//! * `ruledesk-core`: configuration, shared errors and logging setup
//! * `ruledesk-rules`: condition model, validation, facts, templates and the
//!   in-memory rule service
//! * `ruledesk-client`: HTTP client for the rule store and evaluation service
//! * `ruledesk-cli`: the `ruledesk` command-line tool

pub use ruledesk_client as client;
pub use ruledesk_core as core;
pub use ruledesk_rules as rules;

pub use ruledesk_client::RuleStoreClient;
pub use ruledesk_rules::{Condition, ConditionType, Rule, RuleEditor, RuleStore, Template};
