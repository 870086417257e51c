//! Copy-on-write edits over condition sequences.
//!
//! Every operation borrows its input and returns a fresh value; callers keep
//! the previous tree untouched and may discard the new one.

use serde_json::{Map, Value};
use tracing::debug;

use crate::condition::{Condition, ConditionType};
use crate::error::RuleError;

/// Appends a default-shaped condition of `kind`.
///
/// The new node copies the first condition's `successResult`, or starts from
/// an empty object when there is none.
pub fn append_condition(conditions: &[Condition], kind: ConditionType) -> Vec<Condition> {
    let inherited = conditions
        .first()
        .and_then(Condition::success_result)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    let mut updated = conditions.to_vec();
    updated.push(Condition::default_for(kind, Some(inherited)));
    debug!(%kind, len = updated.len(), "appended condition");
    updated
}

pub fn replace_condition(
    conditions: &[Condition],
    index: usize,
    condition: Condition,
) -> Result<Vec<Condition>, RuleError> {
    RuleError::check_index(index, conditions.len())?;
    let mut updated = conditions.to_vec();
    updated[index] = condition;
    Ok(updated)
}

/// Removes the condition at `index`, keeping the order of the rest.
pub fn remove_condition(conditions: &[Condition], index: usize) -> Result<Vec<Condition>, RuleError> {
    RuleError::check_index(index, conditions.len())?;
    let mut updated = conditions.to_vec();
    updated.remove(index);
    Ok(updated)
}

impl Condition {
    pub fn with_child_appended(&self) -> Result<Condition, RuleError> {
        self.edit_children(|children| {
            children.push(Condition::default_child());
            Ok(())
        })
    }

    pub fn with_child_replaced(&self, index: usize, child: Condition) -> Result<Condition, RuleError> {
        self.edit_children(|children| {
            RuleError::check_index(index, children.len())?;
            children[index] = child;
            Ok(())
        })
    }

    pub fn with_child_removed(&self, index: usize) -> Result<Condition, RuleError> {
        self.edit_children(|children| {
            RuleError::check_index(index, children.len())?;
            children.remove(index);
            Ok(())
        })
    }

    pub fn with_value_appended(&self, value: impl Into<String>) -> Result<Condition, RuleError> {
        let value = value.into();
        self.edit_values(|values| {
            values.push(value);
            Ok(())
        })
    }

    pub fn with_value_replaced(
        &self,
        index: usize,
        value: impl Into<String>,
    ) -> Result<Condition, RuleError> {
        let value = value.into();
        self.edit_values(|values| {
            RuleError::check_index(index, values.len())?;
            values[index] = value;
            Ok(())
        })
    }

    pub fn with_value_removed(&self, index: usize) -> Result<Condition, RuleError> {
        self.edit_values(|values| {
            RuleError::check_index(index, values.len())?;
            values.remove(index);
            Ok(())
        })
    }

    fn edit_children(
        &self,
        edit: impl FnOnce(&mut Vec<Condition>) -> Result<(), RuleError>,
    ) -> Result<Condition, RuleError> {
        let mut updated = self.clone();
        let composite = updated
            .as_composite_mut()
            .ok_or(RuleError::NotComposite { kind: self.kind() })?;
        edit(&mut composite.children)?;
        Ok(updated)
    }

    fn edit_values(
        &self,
        edit: impl FnOnce(&mut Vec<String>) -> Result<(), RuleError>,
    ) -> Result<Condition, RuleError> {
        let mut updated = self.clone();
        let membership = updated
            .as_membership_mut()
            .ok_or(RuleError::NotMembership { kind: self.kind() })?;
        edit(&mut membership.values)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Membership, Presence};
    use serde_json::json;

    fn sample() -> Vec<Condition> {
        vec![Condition::Exists(Presence {
            path: "$.orderNo".into(),
            default_result: Some(true),
            success_result: Some(json!({"fulfillment": true, "custom": "V0028"})),
            failure_result: Some(json!({"fulfillment": false})),
        })]
    }

    #[test]
    fn append_leaves_original_untouched() {
        let original = sample();
        let snapshot = original.clone();

        let updated = append_condition(&original, ConditionType::Equals);

        assert_eq!(original, snapshot);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0], original[0]);
    }

    #[test]
    fn append_inherits_first_success_result() {
        let updated = append_condition(&sample(), ConditionType::Or);
        assert_eq!(
            updated[1].success_result(),
            Some(&json!({"fulfillment": true, "custom": "V0028"}))
        );

        let first = append_condition(&[], ConditionType::In);
        assert_eq!(first[0].success_result(), Some(&json!({})));
        assert_eq!(first[0].values(), Some(&[][..]));
    }

    #[test]
    fn remove_compacts_and_preserves_order() {
        let mut conditions = append_condition(&sample(), ConditionType::Equals);
        conditions = append_condition(&conditions, ConditionType::And);

        let updated = remove_condition(&conditions, 1).expect("remove");
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].kind(), ConditionType::Exists);
        assert_eq!(updated[1].kind(), ConditionType::And);
        assert_eq!(conditions.len(), 3);
    }

    #[test]
    fn rejects_out_of_range_indices() {
        assert!(matches!(
            remove_condition(&sample(), 3),
            Err(RuleError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(replace_condition(&[], 0, Condition::default_child()).is_err());
    }

    #[test]
    fn edits_children_copy_on_write() {
        let or = Condition::default_for(ConditionType::Or, None);
        let with_child = or.with_child_appended().expect("append");
        assert_eq!(or.children().map(<[Condition]>::len), Some(0));
        assert_eq!(with_child.children().expect("children")[0], Condition::default_child());

        let replaced = with_child
            .with_child_replaced(0, Condition::default_for(ConditionType::Exists, None))
            .expect("replace");
        assert_eq!(replaced.children().expect("children")[0].kind(), ConditionType::Exists);

        let emptied = replaced.with_child_removed(0).expect("remove");
        assert!(emptied.children().expect("children").is_empty());
        assert!(matches!(
            sample()[0].with_child_appended(),
            Err(RuleError::NotComposite {
                kind: ConditionType::Exists
            })
        ));
    }

    #[test]
    fn edits_values_copy_on_write() {
        let set = Condition::ContainsAny(Membership {
            path: "$.lines[*].node".into(),
            values: vec!["SL9T".into()],
            default_result: None,
            success_result: None,
        });

        let appended = set.with_value_appended("TG1K").expect("append");
        assert_eq!(appended.values(), Some(&["SL9T".to_string(), "TG1K".to_string()][..]));
        assert_eq!(set.values().map(<[String]>::len), Some(1));

        let replaced = appended.with_value_replaced(0, "XB12").expect("replace");
        assert_eq!(replaced.values().expect("values")[0], "XB12");

        let removed = replaced.with_value_removed(1).expect("remove");
        assert_eq!(removed.values(), Some(&["XB12".to_string()][..]));

        assert!(matches!(
            set.with_value_removed(4),
            Err(RuleError::IndexOutOfRange { index: 4, len: 1 })
        ));
        assert!(matches!(
            Condition::default_child().with_value_appended("x"),
            Err(RuleError::NotMembership { .. })
        ));
    }
}
