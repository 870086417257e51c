use serde_json::Value;

use crate::condition::Condition;

/// Whether `condition`, or any of its descendants, mentions `text`.
///
/// Matching is case-insensitive containment over the type, path, value,
/// each entry of values, and the full JSON form of the node. Blank text
/// matches nothing.
pub fn matches(condition: &Condition, text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    matches_lowercase(condition, &text.to_lowercase())
}

/// Indices of the top-level conditions matching `text`.
pub fn matching_indices(conditions: &[Condition], text: &str) -> Vec<usize> {
    conditions
        .iter()
        .enumerate()
        .filter(|(_, condition)| matches(condition, text))
        .map(|(index, _)| index)
        .collect()
}

fn matches_lowercase(condition: &Condition, needle: &str) -> bool {
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    if contains(condition.kind().as_str()) {
        return true;
    }
    if condition.path().is_some_and(|path| contains(path.as_str())) {
        return true;
    }
    if condition.value().is_some_and(|value| contains(&stringify(value))) {
        return true;
    }
    if condition
        .values()
        .is_some_and(|values| values.iter().any(|value| contains(value)))
    {
        return true;
    }
    if serde_json::to_string(condition).is_ok_and(|json| contains(&json)) {
        return true;
    }

    condition
        .children()
        .is_some_and(|children| children.iter().any(|child| matches_lowercase(child, needle)))
}

/// String form used for display and search: strings unquoted, everything
/// else as compact JSON.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
