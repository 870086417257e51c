use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::path::JsonPath;

/// Runtime type tag of a fact's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactType {
    Null,
    Array,
    Object,
    String,
    Number,
    Boolean,
    Undefined,
}

impl FactType {
    pub fn as_str(self) -> &'static str {
        match self {
            FactType::Null => "null",
            FactType::Array => "array",
            FactType::Object => "object",
            FactType::String => "string",
            FactType::Number => "number",
            FactType::Boolean => "boolean",
            FactType::Undefined => "undefined",
        }
    }
}

/// One addressable location present in a sample document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub path: JsonPath,
    pub value: String,
    #[serde(rename = "type")]
    pub fact_type: FactType,
}

const OBJECT_MARKER: &str = "{Object}";
const EMPTY_ARRAY_MARKER: &str = "[Empty Array]";

/// Flattens `document` into its distinct paths, sorted by path.
pub fn extract_facts(document: &Value) -> Vec<Fact> {
    extract_facts_at(document, &JsonPath::root())
}

/// Same as [`extract_facts`], with every path rooted at `root`.
///
/// Arrays collapse to a single `[*]` path and only their first element is
/// walked, so `$.a[1].x` never appears next to `$.a[*].x`.
pub fn extract_facts_at(document: &Value, root: &JsonPath) -> Vec<Fact> {
    let mut collector = FactCollector::default();
    collector.walk(document, root);
    let mut facts = collector.facts;
    facts.sort_by(|a, b| a.path.as_str().cmp(b.path.as_str()));
    facts
}

/// Keeps facts whose path or value contains `term`, ignoring case. An empty
/// term keeps everything.
pub fn filter_facts<'a>(facts: &'a [Fact], term: &str) -> Vec<&'a Fact> {
    let needle = term.to_lowercase();
    facts
        .iter()
        .filter(|fact| {
            fact.path.as_str().to_lowercase().contains(&needle)
                || fact.value.to_lowercase().contains(&needle)
        })
        .collect()
}

#[derive(Default)]
struct FactCollector {
    facts: Vec<Fact>,
    seen: HashSet<JsonPath>,
}

impl FactCollector {
    fn push(&mut self, path: &JsonPath, value: String, fact_type: FactType) {
        if self.seen.insert(path.clone()) {
            self.facts.push(Fact {
                path: path.clone(),
                value,
                fact_type,
            });
        }
    }

    fn walk(&mut self, value: &Value, path: &JsonPath) {
        match value {
            Value::Null => self.push(path, "null".to_string(), FactType::Null),
            Value::Array(items) => {
                let element_path = path.wildcard();
                let summary = if items.is_empty() {
                    EMPTY_ARRAY_MARKER.to_string()
                } else {
                    format!("[Array({})]", items.len())
                };
                self.push(&element_path, summary, FactType::Array);
                if let Some(first) = items.first() {
                    self.walk(first, &element_path);
                }
            }
            Value::Object(map) => {
                for (key, child) in map {
                    let child_path = path.child(key);
                    if child.is_object() {
                        self.push(&child_path, OBJECT_MARKER.to_string(), FactType::Object);
                    }
                    self.walk(child, &child_path);
                }
            }
            Value::String(text) => self.push(path, text.clone(), FactType::String),
            Value::Number(number) => self.push(path, number_text(number), FactType::Number),
            Value::Bool(flag) => self.push(path, flag.to_string(), FactType::Boolean),
        }
    }
}

/// Renders numbers the way they read in a document: `1.0` as `1`.
fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() => float.to_string(),
        _ => number.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(facts: &[Fact]) -> Vec<&str> {
        facts.iter().map(|fact| fact.path.as_str()).collect()
    }

    #[test]
    fn collapses_arrays_to_first_element() {
        let facts = extract_facts(&json!({"a": [{"x": 1}, {"x": 2}]}));
        assert_eq!(paths(&facts), vec!["$.a[*]", "$.a[*].x"]);
        assert_eq!(facts[0].value, "[Array(2)]");
        assert_eq!(facts[0].fact_type, FactType::Array);
        assert_eq!(facts[1].value, "1");
        assert_eq!(facts[1].fact_type, FactType::Number);
    }

    #[test]
    fn marks_nested_objects_and_nulls() {
        let facts = extract_facts(&json!({
            "orderNum": "FN7390702204",
            "shipmentService": false,
            "metaData": {"source": null, "panPresent": "N"},
            "fulfillmentDates": []
        }));

        assert_eq!(
            paths(&facts),
            vec![
                "$.fulfillmentDates[*]",
                "$.metaData",
                "$.metaData.panPresent",
                "$.metaData.source",
                "$.orderNum",
                "$.shipmentService",
            ]
        );
        let by_path = |path: &str| facts.iter().find(|f| f.path.as_str() == path).cloned();
        assert_eq!(
            by_path("$.metaData").map(|f| (f.value, f.fact_type)),
            Some(("{Object}".to_string(), FactType::Object))
        );
        assert_eq!(
            by_path("$.metaData.source").map(|f| (f.value, f.fact_type)),
            Some(("null".to_string(), FactType::Null))
        );
        assert_eq!(
            by_path("$.fulfillmentDates[*]").map(|f| f.value),
            Some("[Empty Array]".to_string())
        );
        assert_eq!(
            by_path("$.shipmentService").map(|f| f.fact_type),
            Some(FactType::Boolean)
        );
    }

    #[test]
    fn handles_non_object_roots() {
        assert_eq!(
            extract_facts(&Value::Null),
            vec![Fact {
                path: JsonPath::root(),
                value: "null".into(),
                fact_type: FactType::Null,
            }]
        );
        assert_eq!(paths(&extract_facts(&json!(["a", "b"]))), vec!["$[*]"]);
        assert_eq!(paths(&extract_facts(&json!([[{"k": 1}]]))), vec!["$[*]", "$[*][*]", "$[*][*].k"]);
        assert_eq!(extract_facts(&json!(7))[0].value, "7");
    }

    #[test]
    fn honours_custom_root() {
        let facts = extract_facts_at(&json!({"id": 1}), &JsonPath::from("$.order"));
        assert_eq!(paths(&facts), vec!["$.order.id"]);
    }

    #[test]
    fn is_deterministic() {
        let document = json!({"z": 1, "a": {"m": [1, 2], "b": null}, "k": [{"q": true}]});
        let first = extract_facts(&document);
        let second = extract_facts(&document);
        assert_eq!(first, second);
        let mut sorted = paths(&first);
        sorted.sort();
        assert_eq!(paths(&first), sorted);
    }

    #[test]
    fn filters_by_path_or_value() {
        let facts = extract_facts(&json!({"paymentType": "COD", "nodeId": "TG1K"}));
        let hits = filter_facts(&facts, "cod");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path.as_str(), "$.paymentType");
        assert_eq!(filter_facts(&facts, "NODE").len(), 1);
        assert_eq!(filter_facts(&facts, "").len(), 2);
    }

    #[test]
    fn renders_numbers_as_written() {
        let facts = extract_facts(&json!({"qty": 1.0, "price": 2.5, "count": 3, "debt": -7}));
        let value_of = |path: &str| {
            facts
                .iter()
                .find(|fact| fact.path.as_str() == path)
                .map(|fact| fact.value.as_str())
        };
        assert_eq!(value_of("$.qty"), Some("1"));
        assert_eq!(value_of("$.price"), Some("2.5"));
        assert_eq!(value_of("$.count"), Some("3"));
        assert_eq!(value_of("$.debt"), Some("-7"));
    }
}
