use crate::condition::{Condition, ConditionType};
use crate::search::stringify;
use crate::template::Template;

const RESULT_PREVIEW_LIMIT: usize = 50;
const VALUES_PREVIEW_LIMIT: usize = 3;

/// Header label shown for a condition.
pub fn label(condition: &Condition) -> &'static str {
    match condition.kind() {
        ConditionType::Or => "OR Rule",
        ConditionType::And => "AND Rule",
        _ => "Single Condition",
    }
}

/// Short reading of the condition logic, with paths shown by their
/// template names. Composites preview their first child.
pub fn preview(condition: &Condition, template: &Template) -> String {
    if let Some(children) = condition.children() {
        return children
            .first()
            .map(|child| preview(child, template))
            .unwrap_or_default();
    }

    let path_name = condition
        .path()
        .filter(|path| !path.is_empty())
        .map(|path| template.display_name(path.as_str()).to_string())
        .unwrap_or_default();

    if let Some(values) = condition.values() {
        if values.is_empty() {
            return path_name;
        }
        let mut listed = values
            .iter()
            .take(VALUES_PREVIEW_LIMIT)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if values.len() > VALUES_PREVIEW_LIMIT {
            listed.push_str("...");
        }
        let verb = match condition.kind() {
            ConditionType::ContainsAll => "contains",
            _ => "in",
        };
        return format!("{path_name} {verb} {listed}");
    }

    if condition.kind() == ConditionType::Exists {
        return format!("{path_name} exists");
    }

    match condition.value().map(stringify) {
        Some(value) if !value.is_empty() => format!("{path_name} = {value}"),
        _ => path_name,
    }
}

/// Compact JSON of the success result, truncated for headers.
pub fn result_text(condition: &Condition) -> String {
    match condition.success_result() {
        Some(result) => {
            let text = result.to_string();
            if text.chars().count() > RESULT_PREVIEW_LIMIT {
                let mut truncated: String = text.chars().take(RESULT_PREVIEW_LIMIT).collect();
                truncated.push_str("...");
                truncated
            } else {
                text
            }
        }
        None => "No result".to_string(),
    }
}

/// One-line description: `Result: {...} (Condition: Order No exists)`.
pub fn describe(condition: &Condition, template: &Template) -> String {
    let result = result_text(condition);
    let preview = preview(condition, template);
    if preview.is_empty() {
        format!("Result: {result}")
    } else {
        format!("Result: {result} (Condition: {preview})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateEntry;
    use crate::validate::parse_conditions;

    fn template() -> Template {
        Template::from_entries(vec![
            TemplateEntry::new("$.orderNo", "Order No"),
            TemplateEntry::new("$.lines[*].node", "Lines Node"),
        ])
        .expect("template")
    }

    #[test]
    fn describes_leaves_with_template_names() {
        let conditions = parse_conditions(
            r#"[
                {"type": "exists", "path": "$.orderNo", "successResult": {"fulfillment": true}},
                {"type": "equals", "path": "$.paymentType", "value": "COD"},
                {"type": "contains_all", "path": "$.lines[*].node", "values": ["A", "B", "C", "D"]},
                {"type": "less_than", "path": "$.qty", "value": ""}
            ]"#,
        )
        .expect("conditions");
        let template = template();

        assert_eq!(
            describe(&conditions[0], &template),
            r#"Result: {"fulfillment":true} (Condition: Order No exists)"#
        );
        assert_eq!(
            describe(&conditions[1], &template),
            "Result: No result (Condition: $.paymentType = COD)"
        );
        assert_eq!(preview(&conditions[2], &template), "Lines Node contains A, B, C...");
        assert_eq!(preview(&conditions[3], &template), "$.qty");
        assert_eq!(label(&conditions[0]), "Single Condition");
    }

    #[test]
    fn previews_composites_through_first_child() {
        let conditions = parse_conditions(
            r#"[
                {"type": "or", "children": [
                    {"type": "contains_any", "path": "$.lines[*].node", "values": ["SL9T"]}
                ]},
                {"type": "and", "children": []}
            ]"#,
        )
        .expect("conditions");

        assert_eq!(label(&conditions[0]), "OR Rule");
        assert_eq!(preview(&conditions[0], &template()), "Lines Node in SL9T");
        assert_eq!(describe(&conditions[1], &template()), "Result: No result");
    }

    #[test]
    fn truncates_long_results() {
        let conditions = parse_conditions(
            r#"[{"type": "exists", "path": "$.a", "successResult": {"note": "a very long outcome payload that keeps going"}}]"#,
        )
        .expect("conditions");
        let text = result_text(&conditions[0]);
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), RESULT_PREVIEW_LIMIT + 3);
    }
}
