use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::JsonPath;

/// Discriminant of a [`Condition`], as written in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    In,
    ContainsAny,
    ContainsAll,
    Exists,
    And,
    Or,
}

impl ConditionType {
    pub const ALL: [ConditionType; 12] = [
        ConditionType::Exists,
        ConditionType::Equals,
        ConditionType::In,
        ConditionType::ContainsAny,
        ConditionType::ContainsAll,
        ConditionType::NotEquals,
        ConditionType::GreaterThan,
        ConditionType::LessThan,
        ConditionType::GreaterThanOrEqual,
        ConditionType::LessThanOrEqual,
        ConditionType::Or,
        ConditionType::And,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionType::Equals => "equals",
            ConditionType::NotEquals => "not_equals",
            ConditionType::GreaterThan => "greater_than",
            ConditionType::LessThan => "less_than",
            ConditionType::GreaterThanOrEqual => "greater_than_or_equal",
            ConditionType::LessThanOrEqual => "less_than_or_equal",
            ConditionType::In => "in",
            ConditionType::ContainsAny => "contains_any",
            ConditionType::ContainsAll => "contains_all",
            ConditionType::Exists => "exists",
            ConditionType::And => "and",
            ConditionType::Or => "or",
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(self, ConditionType::And | ConditionType::Or)
    }

    pub fn is_membership(self) -> bool {
        matches!(
            self,
            ConditionType::In | ConditionType::ContainsAny | ConditionType::ContainsAll
        )
    }

    pub fn is_comparison(self) -> bool {
        !self.is_composite() && !self.is_membership() && self != ConditionType::Exists
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ConditionType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| format!("unknown condition type: {value}"))
    }
}

/// Leaf comparing the value at `path` against a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub path: JsonPath,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_result: Option<Value>,
}

/// Leaf testing the value at `path` against a set of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub path: JsonPath,
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_result: Option<Value>,
}

/// Leaf checking that `path` resolves, with distinct outcomes either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub path: JsonPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_result: Option<Value>,
}

/// `and` / `or` node over an ordered list of children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composite {
    pub children: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_result: Option<Value>,
}

/// One node of a rule's boolean expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Equals(Comparison),
    NotEquals(Comparison),
    GreaterThan(Comparison),
    LessThan(Comparison),
    GreaterThanOrEqual(Comparison),
    LessThanOrEqual(Comparison),
    In(Membership),
    ContainsAny(Membership),
    ContainsAll(Membership),
    Exists(Presence),
    And(Composite),
    Or(Composite),
}

impl Condition {
    /// Empty condition of the given type, shaped so every required field is
    /// present. Paths start empty and must be filled before saving.
    pub fn default_for(kind: ConditionType, success_result: Option<Value>) -> Self {
        let empty = JsonPath::default();
        let comparison = || Comparison {
            path: empty.clone(),
            value: Value::String(String::new()),
            default_result: Some(false),
            success_result: success_result.clone(),
        };
        let membership = || Membership {
            path: empty.clone(),
            values: Vec::new(),
            default_result: Some(false),
            success_result: success_result.clone(),
        };
        let composite = || Composite {
            children: Vec::new(),
            default_result: Some(false),
            success_result: success_result.clone(),
        };

        match kind {
            ConditionType::Equals => Condition::Equals(comparison()),
            ConditionType::NotEquals => Condition::NotEquals(comparison()),
            ConditionType::GreaterThan => Condition::GreaterThan(comparison()),
            ConditionType::LessThan => Condition::LessThan(comparison()),
            ConditionType::GreaterThanOrEqual => Condition::GreaterThanOrEqual(comparison()),
            ConditionType::LessThanOrEqual => Condition::LessThanOrEqual(comparison()),
            ConditionType::In => Condition::In(membership()),
            ConditionType::ContainsAny => Condition::ContainsAny(membership()),
            ConditionType::ContainsAll => Condition::ContainsAll(membership()),
            ConditionType::Exists => Condition::Exists(Presence {
                path: empty.clone(),
                default_result: Some(false),
                success_result: success_result.clone(),
                failure_result: Some(Value::Object(Map::new())),
            }),
            ConditionType::And => Condition::And(composite()),
            ConditionType::Or => Condition::Or(composite()),
        }
    }

    /// Leaf added under a composite node from the editor.
    pub fn default_child() -> Self {
        Condition::Equals(Comparison {
            path: JsonPath::default(),
            value: Value::String(String::new()),
            default_result: Some(false),
            success_result: None,
        })
    }

    pub fn kind(&self) -> ConditionType {
        match self {
            Condition::Equals(_) => ConditionType::Equals,
            Condition::NotEquals(_) => ConditionType::NotEquals,
            Condition::GreaterThan(_) => ConditionType::GreaterThan,
            Condition::LessThan(_) => ConditionType::LessThan,
            Condition::GreaterThanOrEqual(_) => ConditionType::GreaterThanOrEqual,
            Condition::LessThanOrEqual(_) => ConditionType::LessThanOrEqual,
            Condition::In(_) => ConditionType::In,
            Condition::ContainsAny(_) => ConditionType::ContainsAny,
            Condition::ContainsAll(_) => ConditionType::ContainsAll,
            Condition::Exists(_) => ConditionType::Exists,
            Condition::And(_) => ConditionType::And,
            Condition::Or(_) => ConditionType::Or,
        }
    }

    /// Path referenced by a leaf; composites have none.
    pub fn path(&self) -> Option<&JsonPath> {
        match self {
            Condition::Equals(c)
            | Condition::NotEquals(c)
            | Condition::GreaterThan(c)
            | Condition::LessThan(c)
            | Condition::GreaterThanOrEqual(c)
            | Condition::LessThanOrEqual(c) => Some(&c.path),
            Condition::In(m) | Condition::ContainsAny(m) | Condition::ContainsAll(m) => {
                Some(&m.path)
            }
            Condition::Exists(p) => Some(&p.path),
            Condition::And(_) | Condition::Or(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.as_comparison().map(|c| &c.value)
    }

    pub fn values(&self) -> Option<&[String]> {
        self.as_membership().map(|m| m.values.as_slice())
    }

    pub fn children(&self) -> Option<&[Condition]> {
        self.as_composite().map(|c| c.children.as_slice())
    }

    pub fn success_result(&self) -> Option<&Value> {
        match self {
            Condition::Equals(c)
            | Condition::NotEquals(c)
            | Condition::GreaterThan(c)
            | Condition::LessThan(c)
            | Condition::GreaterThanOrEqual(c)
            | Condition::LessThanOrEqual(c) => c.success_result.as_ref(),
            Condition::In(m) | Condition::ContainsAny(m) | Condition::ContainsAll(m) => {
                m.success_result.as_ref()
            }
            Condition::Exists(p) => p.success_result.as_ref(),
            Condition::And(c) | Condition::Or(c) => c.success_result.as_ref(),
        }
    }

    pub fn default_result(&self) -> Option<bool> {
        match self {
            Condition::Equals(c)
            | Condition::NotEquals(c)
            | Condition::GreaterThan(c)
            | Condition::LessThan(c)
            | Condition::GreaterThanOrEqual(c)
            | Condition::LessThanOrEqual(c) => c.default_result,
            Condition::In(m) | Condition::ContainsAny(m) | Condition::ContainsAll(m) => {
                m.default_result
            }
            Condition::Exists(p) => p.default_result,
            Condition::And(c) | Condition::Or(c) => c.default_result,
        }
    }

    pub fn as_comparison(&self) -> Option<&Comparison> {
        match self {
            Condition::Equals(c)
            | Condition::NotEquals(c)
            | Condition::GreaterThan(c)
            | Condition::LessThan(c)
            | Condition::GreaterThanOrEqual(c)
            | Condition::LessThanOrEqual(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_membership(&self) -> Option<&Membership> {
        match self {
            Condition::In(m) | Condition::ContainsAny(m) | Condition::ContainsAll(m) => Some(m),
            _ => None,
        }
    }

    pub(crate) fn as_membership_mut(&mut self) -> Option<&mut Membership> {
        match self {
            Condition::In(m) | Condition::ContainsAny(m) | Condition::ContainsAll(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&Composite> {
        match self {
            Condition::And(c) | Condition::Or(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn as_composite_mut(&mut self) -> Option<&mut Composite> {
        match self {
            Condition::And(c) | Condition::Or(c) => Some(c),
            _ => None,
        }
    }

    /// Pre-order walk over this node and every descendant.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Condition)) {
        visit(self);
        if let Some(children) = self.children() {
            for child in children {
                child.walk(visit);
            }
        }
    }
}
