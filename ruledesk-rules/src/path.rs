use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dollar-rooted JSON path addressing a location inside a document.
///
/// Supported segments are `.name`, `[3]`, `[*]` and `[?(predicate)]`.
/// Filter predicates are carried verbatim and never interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct JsonPath(String);

/// One navigation step of a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
    Wildcard,
    Filter(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path must start with '$': {0}")]
    MissingRoot(String),
    #[error("empty field name at offset {offset} in {path}")]
    EmptyField { path: String, offset: usize },
    #[error("unterminated bracket segment at offset {offset} in {path}")]
    Unterminated { path: String, offset: usize },
    #[error("invalid bracket segment [{segment}] in {path}")]
    InvalidBracket { path: String, segment: String },
    #[error("unexpected character '{found}' at offset {offset} in {path}")]
    Unexpected {
        path: String,
        offset: usize,
        found: char,
    },
}

impl JsonPath {
    pub const ROOT: &'static str = "$";

    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    /// Appends a `.key` segment.
    pub fn child(&self, key: &str) -> Self {
        Self(format!("{}.{}", self.0, key))
    }

    /// Appends an `[index]` segment.
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    /// Appends the `[*]` wildcard segment.
    pub fn wildcard(&self) -> Self {
        Self(format!("{}[*]", self.0))
    }

    /// Number of navigation steps below the root. Counts dots and opening
    /// brackets, so it never fails on malformed input.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut bracket = 0usize;
        for ch in self.0.chars() {
            match ch {
                '[' => {
                    if bracket == 0 {
                        depth += 1;
                    }
                    bracket += 1;
                }
                ']' => bracket = bracket.saturating_sub(1),
                '.' if bracket == 0 => depth += 1,
                _ => {}
            }
        }
        depth
    }

    /// Parses the path into navigation segments.
    pub fn segments(&self) -> Result<Vec<PathSegment>, PathError> {
        let path = self.0.as_str();
        let rest = path
            .strip_prefix('$')
            .ok_or_else(|| PathError::MissingRoot(path.to_string()))?;

        let mut segments = Vec::new();
        let bytes: Vec<char> = rest.chars().collect();
        let mut pos = 0;
        while pos < bytes.len() {
            let offset = pos + 1;
            match bytes[pos] {
                '.' => {
                    let start = pos + 1;
                    let mut end = start;
                    while end < bytes.len() && bytes[end] != '.' && bytes[end] != '[' {
                        end += 1;
                    }
                    if end == start {
                        return Err(PathError::EmptyField {
                            path: path.to_string(),
                            offset,
                        });
                    }
                    segments.push(PathSegment::Field(bytes[start..end].iter().collect()));
                    pos = end;
                }
                '[' => {
                    let close = matching_bracket(&bytes, pos).ok_or_else(|| {
                        PathError::Unterminated {
                            path: path.to_string(),
                            offset,
                        }
                    })?;
                    let inner: String = bytes[pos + 1..close].iter().collect();
                    segments.push(bracket_segment(path, inner)?);
                    pos = close + 1;
                }
                other => {
                    return Err(PathError::Unexpected {
                        path: path.to_string(),
                        offset,
                        found: other,
                    })
                }
            }
        }
        Ok(segments)
    }
}

fn matching_bracket(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in chars.iter().enumerate().skip(open) {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn bracket_segment(path: &str, inner: String) -> Result<PathSegment, PathError> {
    if inner == "*" {
        return Ok(PathSegment::Wildcard);
    }
    if let Some(predicate) = inner.strip_prefix("?(").and_then(|p| p.strip_suffix(')')) {
        return Ok(PathSegment::Filter(predicate.to_string()));
    }
    inner
        .trim()
        .parse::<usize>()
        .map(PathSegment::Index)
        .map_err(|_| PathError::InvalidBracket {
            path: path.to_string(),
            segment: inner,
        })
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JsonPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JsonPath {
    fn from(value: &str) -> Self {
        JsonPath::new(value)
    }
}

impl From<String> for JsonPath {
    fn from(value: String) -> Self {
        JsonPath::new(value)
    }
}

/// Builds a human label from a path: `$.lines[*].node` becomes `Lines Node`.
///
/// Total over any input; malformed paths degrade to a best-effort label.
pub fn generate_name_from_path(path: &str) -> String {
    let trimmed = match path.find("$.") {
        Some(at) => {
            let mut owned = String::with_capacity(path.len());
            owned.push_str(&path[..at]);
            owned.push_str(&path[at + 2..]);
            owned
        }
        None => path.to_string(),
    };

    let mut without_brackets = String::with_capacity(trimmed.len());
    let mut depth = 0usize;
    for ch in trimmed.chars() {
        match ch {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => without_brackets.push(ch),
            _ => {}
        }
    }

    without_brackets
        .split(|ch: char| ch == '.' || ch.is_whitespace())
        .flat_map(split_camel_case)
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_camel_case(word: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous: Option<char> = None;
    for ch in word.chars() {
        if ch.is_uppercase() {
            if let Some(prev) = previous {
                if prev.is_lowercase() || prev.is_ascii_digit() {
                    words.push(std::mem::take(&mut current));
                }
            }
        }
        current.push(ch);
        previous = Some(ch);
    }
    words.push(current);
    words
}

fn capitalize(word: String) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("$.lines[*].node", "Lines Node" ; "wildcard segment dropped")]
    #[test_case("$.orderNo", "Order No" ; "camel case split")]
    #[test_case("$.lines[?(@.fulfillmentNodeType == 'JIT')].order.state", "Lines Order State" ; "filter segment dropped")]
    #[test_case("$.metaData.panPresent", "Meta Data Pan Present" ; "nested fields")]
    #[test_case("$.fulfillmentOrderLines[0].nodeId", "Fulfillment Order Lines Node Id" ; "index segment dropped")]
    #[test_case("", "" ; "empty input")]
    #[test_case("$", "$" ; "bare root")]
    #[test_case("$.a[unclosed", "A" ; "unterminated bracket")]
    fn generates_names(path: &str, expected: &str) {
        assert_eq!(generate_name_from_path(path), expected);
    }

    #[test]
    fn builds_child_paths() {
        let path = JsonPath::root().child("lines").wildcard().child("node");
        assert_eq!(path.as_str(), "$.lines[*].node");
        assert_eq!(path.depth(), 3);
        assert_eq!(JsonPath::root().index(2).as_str(), "$[2]");
    }

    #[test]
    fn parses_segments() {
        let path = JsonPath::from("$.lines[?(@.tags[0] == 'x')].qty[2][*]");
        assert_eq!(
            path.segments().expect("segments"),
            vec![
                PathSegment::Field("lines".into()),
                PathSegment::Filter("@.tags[0] == 'x'".into()),
                PathSegment::Field("qty".into()),
                PathSegment::Index(2),
                PathSegment::Wildcard,
            ]
        );
        assert!(JsonPath::root().segments().expect("root").is_empty());
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(matches!(
            JsonPath::from("orderNo").segments(),
            Err(PathError::MissingRoot(_))
        ));
        assert!(matches!(
            JsonPath::from("$..orderNo").segments(),
            Err(PathError::EmptyField { offset: 1, .. })
        ));
        assert!(matches!(
            JsonPath::from("$.lines[abc]").segments(),
            Err(PathError::InvalidBracket { .. })
        ));
        assert!(matches!(
            JsonPath::from("$.lines[*").segments(),
            Err(PathError::Unterminated { .. })
        ));
    }
}
