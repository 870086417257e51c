use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::condition::Condition;
use crate::path::{generate_name_from_path, JsonPath};

/// Display name attached to a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub path: JsonPath,
    pub name: String,
}

impl TemplateEntry {
    pub fn new(path: impl Into<JsonPath>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Entry named after its own path.
    pub fn generated(path: impl Into<JsonPath>) -> Self {
        let path = path.into();
        let name = generate_name_from_path(path.as_str());
        Self { path, name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("path \"{0}\" already exists in the template")]
    DuplicatePath(JsonPath),
    #[error("template entry {index} does not exist ({len} entries)")]
    MissingEntry { index: usize, len: usize },
}

/// Ordered catalog of named paths for one rule. Paths are unique, also
/// when decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<TemplateEntry>", try_from = "Vec<TemplateEntry>")]
pub struct Template {
    entries: Vec<TemplateEntry>,
}

impl TryFrom<Vec<TemplateEntry>> for Template {
    type Error = TemplateError;

    fn try_from(entries: Vec<TemplateEntry>) -> Result<Self, Self::Error> {
        Template::from_entries(entries)
    }
}

impl From<Template> for Vec<TemplateEntry> {
    fn from(template: Template) -> Self {
        template.entries
    }
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a template from entries, rejecting the first repeated path.
    pub fn from_entries(entries: Vec<TemplateEntry>) -> Result<Self, TemplateError> {
        let mut template = Template::new();
        for entry in entries {
            template.add(entry)?;
        }
        Ok(template)
    }

    /// Collects every distinct path referenced by the tree, in first
    /// appearance order, naming each from its path.
    pub fn from_conditions(conditions: &[Condition]) -> Self {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for condition in conditions {
            condition.walk(&mut |node| {
                if let Some(path) = node.path() {
                    if !path.is_empty() && seen.insert(path.clone()) {
                        entries.push(TemplateEntry::generated(path.clone()));
                    }
                }
            });
        }
        debug!(paths = entries.len(), "generated template from conditions");
        Self { entries }
    }

    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.entries.iter().any(|entry| entry.path.as_str() == path)
    }

    pub fn add(&mut self, entry: TemplateEntry) -> Result<(), TemplateError> {
        if self.contains_path(entry.path.as_str()) {
            return Err(TemplateError::DuplicatePath(entry.path));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Rewrites the entry at `index`. A path already held by another entry
    /// is rejected.
    pub fn edit(
        &mut self,
        index: usize,
        path: impl Into<JsonPath>,
        name: impl Into<String>,
    ) -> Result<(), TemplateError> {
        let len = self.entries.len();
        if index >= len {
            return Err(TemplateError::MissingEntry { index, len });
        }
        let path = path.into();
        let clash = self
            .entries
            .iter()
            .enumerate()
            .any(|(other, entry)| other != index && entry.path == path);
        if clash {
            return Err(TemplateError::DuplicatePath(path));
        }
        self.entries[index] = TemplateEntry {
            path,
            name: name.into(),
        };
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<TemplateEntry, TemplateError> {
        let len = self.entries.len();
        if index >= len {
            return Err(TemplateError::MissingEntry { index, len });
        }
        Ok(self.entries.remove(index))
    }

    pub fn name_for(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.path.as_str() == path)
            .map(|entry| entry.name.as_str())
    }

    /// Name for `path` when catalogued, the raw path otherwise.
    pub fn display_name<'a>(&'a self, path: &'a str) -> &'a str {
        self.name_for(path).unwrap_or(path)
    }
}

impl IntoIterator for Template {
    type Item = TemplateEntry;
    type IntoIter = std::vec::IntoIter<TemplateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::parse_conditions;

    #[test]
    fn rejects_duplicate_paths() {
        let mut template = Template::new();
        template.add(TemplateEntry::new("$.a", "A")).expect("first add");

        let err = template.add(TemplateEntry::new("$.a", "B")).unwrap_err();
        assert_eq!(err, TemplateError::DuplicatePath("$.a".into()));
        assert_eq!(template.entries(), &[TemplateEntry::new("$.a", "A")]);

        template.add(TemplateEntry::new("$.A", "Upper")).expect("case sensitive");
        assert_eq!(template.len(), 2);
    }

    #[test]
    fn edits_and_removes_by_index() {
        let mut template = Template::from_entries(vec![
            TemplateEntry::new("$.orderNo", "Order No"),
            TemplateEntry::new("$.lines[*].node", "Lines Node"),
        ])
        .expect("template");

        template.edit(0, "$.orderNo", "Order Number").expect("rename");
        assert_eq!(template.name_for("$.orderNo"), Some("Order Number"));

        assert!(matches!(
            template.edit(0, "$.lines[*].node", "Clash"),
            Err(TemplateError::DuplicatePath(_))
        ));
        assert_eq!(template.name_for("$.orderNo"), Some("Order Number"));

        let removed = template.remove(1).expect("remove");
        assert_eq!(removed.name, "Lines Node");
        assert!(matches!(
            template.remove(5),
            Err(TemplateError::MissingEntry { index: 5, len: 1 })
        ));
        assert_eq!(template.display_name("$.email"), "$.email");
    }

    #[test]
    fn bulk_generates_from_nested_conditions() {
        let conditions = parse_conditions(
            r#"[
                {"type": "exists", "path": "$.orderNo"},
                {"type": "or", "children": [
                    {"type": "in", "path": "$.email", "values": []},
                    {"type": "and", "children": [
                        {"type": "contains_any", "path": "$.lines[*].node", "values": ["SL9T"]},
                        {"type": "equals", "path": "$.orderNo", "value": "x"}
                    ]}
                ]}
            ]"#,
        )
        .expect("conditions");

        let template = Template::from_conditions(&conditions);
        assert_eq!(
            template.entries(),
            &[
                TemplateEntry::new("$.orderNo", "Order No"),
                TemplateEntry::new("$.email", "Email"),
                TemplateEntry::new("$.lines[*].node", "Lines Node"),
            ]
        );
    }

    #[test]
    fn serializes_as_plain_list() {
        let template = Template::from_entries(vec![TemplateEntry::new("$.a", "A")]).expect("template");
        assert_eq!(
            serde_json::to_value(&template).expect("encode"),
            serde_json::json!([{"path": "$.a", "name": "A"}])
        );
    }

    #[test]
    fn decoding_rejects_repeated_paths() {
        let err = serde_json::from_value::<Template>(serde_json::json!([
            {"path": "$.a", "name": "A"},
            {"path": "$.a", "name": "B"}
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("\"$.a\" already exists"));

        let decoded: Template = serde_json::from_value(serde_json::json!([
            {"path": "$.a", "name": "A"},
            {"path": "$.b", "name": "B"}
        ]))
        .expect("distinct paths");
        assert_eq!(decoded.len(), 2);
    }
}
