use std::fs;
use std::io;
use std::path::Path;

use colored::Colorize;
use ruledesk_client::ClientError;
use ruledesk_core::RuleDeskError;
use ruledesk_rules::{
    conditions_from_value, describe, label, validate_value, Condition, Fact, Rule, RuleError,
    Template, TemplateEntry, TestOutcome, ValidationError,
};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("{path} is not valid JSON: {reason}")]
    Json { path: String, reason: String },
    #[error(transparent)]
    Config(#[from] RuleDeskError),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("rule service failed: {0}")]
    Server(String),
    #[error("{0}")]
    Validation(String),
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Read {
            path: "stdin".into(),
            reason: value.to_string(),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(value: anyhow::Error) -> Self {
        Self::Server(value.to_string())
    }
}

/// Reads a JSON document from `path`, or from stdin when `path` is `-`.
pub fn read_json(path: &Path) -> Result<Value, CliError> {
    let display = path.display().to_string();
    let raw = if display == "-" {
        io::read_to_string(io::stdin())?
    } else {
        fs::read_to_string(path).map_err(|err| CliError::Read {
            path: display.clone(),
            reason: err.to_string(),
        })?
    };
    serde_json::from_str(&raw).map_err(|err| CliError::Json {
        path: display,
        reason: err.to_string(),
    })
}

/// Condition sequence held by a file: either a bare array or a rule
/// object whose `payload` carries it.
pub fn read_conditions(path: &Path) -> Result<Vec<Condition>, CliError> {
    Ok(conditions_from_value(payload_of(read_json(path)?))?)
}

pub fn payload_of(document: Value) -> Value {
    match document {
        Value::Object(mut rule) if rule.contains_key("ruleId") => rule
            .remove("payload")
            .unwrap_or_else(|| Value::Array(Vec::new())),
        other => other,
    }
}

pub fn read_rule(path: &Path) -> Result<Rule, CliError> {
    Ok(Rule::from_value(read_json(path)?)?)
}

pub fn read_template(path: &Path) -> Result<Vec<TemplateEntry>, CliError> {
    let document = read_json(path)?;
    let entries: Vec<TemplateEntry> =
        serde_json::from_value(document).map_err(|err| CliError::Json {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
    Template::from_entries(entries.clone()).map_err(RuleError::from)?;
    Ok(entries)
}

/// Validates raw JSON, reporting the failing node the way operators
/// locate it: top-level index plus the nested child positions.
pub fn check_payload(payload: &Value) -> Result<usize, CliError> {
    validate_value(payload).map_err(|err| CliError::Validation(validation_message(&err)))?;
    Ok(payload.as_array().map(Vec::len).unwrap_or_default())
}

pub fn validation_message(err: &ValidationError) -> String {
    let location = err.location();
    if location.len() > 1 {
        let trail = location
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(" > ");
        format!("{err} (at {trail})")
    } else {
        err.to_string()
    }
}

pub fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    Ok(ruledesk_core::serde_utils::to_pretty_json(value)?)
}

pub fn print_valid(count: usize) {
    println!(
        "{} {} top-level condition(s)",
        "✔ Payload is valid:".green().bold(),
        count
    );
}

pub fn print_facts(facts: &[&Fact]) {
    let labels = facts
        .iter()
        .map(|fact| {
            let indent = "  ".repeat(fact.path.depth().saturating_sub(1));
            format!("{indent}{}", fact.path)
        })
        .collect::<Vec<_>>();
    let width = labels.iter().map(String::len).max().unwrap_or_default();
    for (fact, label) in facts.iter().zip(&labels) {
        println!(
            "{:width$}  {:7}  {}",
            label.cyan(),
            fact.fact_type.as_str().dimmed(),
            fact.value,
            width = width
        );
    }
}

/// Paths in the tree that do not parse, as `(top-level index, message)`.
pub fn lint_paths(conditions: &[Condition]) -> Vec<(usize, String)> {
    let mut findings = Vec::new();
    for (index, condition) in conditions.iter().enumerate() {
        condition.walk(&mut |node| {
            if let Some(path) = node.path().filter(|path| !path.is_empty()) {
                if let Err(err) = path.segments() {
                    findings.push((index, format!("path '{path}': {err}")));
                }
            }
        });
    }
    findings
}

pub fn print_lint(findings: &[(usize, String)]) {
    for (index, message) in findings {
        println!("{} #{index} {message}", "⚠".yellow().bold());
    }
}

pub fn print_conditions(conditions: &[Condition], indices: &[usize], template: &Template) {
    for &index in indices {
        if let Some(condition) = conditions.get(index) {
            println!(
                "{} {} {}",
                format!("#{index}").bold(),
                format!("[{}]", label(condition)).yellow(),
                describe(condition, template)
            );
        }
    }
}

pub fn print_rules(rules: &[Rule]) {
    if rules.is_empty() {
        println!("{}", "No rules found".dimmed());
        return;
    }
    for rule in rules {
        let state = if rule.enabled {
            "enabled".green()
        } else {
            "disabled".red()
        };
        println!(
            "{} v{} {} ({} condition(s)){}",
            rule.rule_id.bold(),
            rule.version,
            state,
            rule.conditions().len(),
            rule.modified_by
                .as_deref()
                .map(|user| format!(" by {user}"))
                .unwrap_or_default()
        );
    }
}

pub fn print_saved(rule: &Rule) {
    println!(
        "{} {} (version {})",
        "✔ Rule saved:".green().bold(),
        rule.rule_id.bold(),
        rule.version
    );
}

pub fn print_toggled(rule: &Rule) {
    let verb = if rule.enabled { "enabled" } else { "disabled" };
    println!(
        "{} {} (version {})",
        format!("✔ Rule {verb}:").green().bold(),
        rule.rule_id.bold(),
        rule.version
    );
}

pub fn print_outcome(outcome: &TestOutcome) -> Result<(), CliError> {
    let verdict = if outcome.result {
        "✔ Rule matched".green().bold()
    } else {
        "✘ Rule did not match".red().bold()
    };
    println!("{verdict}");
    if let Some(matched) = &outcome.matched_rules {
        if !matched.is_empty() {
            println!("  Matched: {}", matched.join(", "));
        }
    }
    if let Some(output) = &outcome.output {
        println!("  Output: {}", to_pretty(output)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn reads_conditions_from_rule_or_array() {
        let array = write_temp(r#"[{"type": "exists", "path": "$.orderNo"}]"#);
        assert_eq!(read_conditions(array.path()).expect("array").len(), 1);

        let rule = write_temp(
            r#"{"ruleId": "PILOT_RULES", "tenantId": "AJIOB2C",
                "payload": [{"type": "in", "path": "$.state", "values": ["KA"]}]}"#,
        );
        assert_eq!(read_conditions(rule.path()).expect("rule").len(), 1);

        let bare_rule = write_temp(r#"{"ruleId": "SHIPPING_RULES", "tenantId": "AJIOB2C"}"#);
        assert!(read_conditions(bare_rule.path()).expect("no payload").is_empty());
    }

    #[test]
    fn reports_nested_location() {
        let payload = serde_json::json!([
            {"type": "and", "children": [{"type": "equals", "path": "$.a"}]}
        ]);
        let err = check_payload(&payload).expect_err("missing value");
        assert_eq!(
            err.to_string(),
            "Child condition error: equals condition at index 0 must have 'value' field (at 0 > 0)"
        );
    }

    #[test]
    fn lints_nested_paths() {
        let conditions = ruledesk_rules::parse_conditions(
            r#"[
                {"type": "exists", "path": "$.orderNo"},
                {"type": "or", "children": [{"type": "equals", "path": "$.lines[*", "value": "A"}]}
            ]"#,
        )
        .expect("conditions");
        let findings = lint_paths(&conditions);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].0, 1);
        assert!(findings[0].1.starts_with("path '$.lines[*'"));
    }

    #[test]
    fn rule_files_go_through_raw_validation() {
        let rule = write_temp(
            r#"{"ruleId": "PILOT_RULES", "tenantId": "AJIOB2C",
                "payload": [{"type": "or", "path": "$.x", "children": []}]}"#,
        );
        assert!(matches!(read_rule(rule.path()), Err(CliError::Rule(_))));
    }

    #[test]
    fn rejects_malformed_files() {
        let broken = write_temp("{not json");
        assert!(matches!(read_json(broken.path()), Err(CliError::Json { .. })));

        let duplicate = write_temp(
            r#"[{"path": "$.orderNo", "name": "Order No"}, {"path": "$.orderNo", "name": "Again"}]"#,
        );
        assert!(matches!(read_template(duplicate.path()), Err(CliError::Rule(_))));
    }
}
