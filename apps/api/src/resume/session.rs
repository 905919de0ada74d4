//! Unsaved-change tracking for an editing client.
//!
//! An `EditSession` is an owned value handed through the call chain. It holds
//! two snapshots: the working copy and the last persisted baseline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::{create_diff, Diff};

/// True when `current` differs structurally from `baseline`.
pub fn has_unsaved_changes(current: &Value, baseline: &Value) -> bool {
    !create_diff(baseline, current).is_empty()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditSession {
    pub current: Value,
    pub baseline: Value,
}

impl EditSession {
    /// Starts a session with both snapshots equal to the persisted state.
    pub fn new(persisted: Value) -> Self {
        Self {
            current: persisted.clone(),
            baseline: persisted,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        has_unsaved_changes(&self.current, &self.baseline)
    }

    /// Diff a save would commit right now.
    pub fn pending_diff(&self) -> Diff {
        create_diff(&self.baseline, &self.current)
    }

    pub fn edit(self, current: Value) -> Self {
        Self { current, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_session_is_clean() {
        let session = EditSession::new(json!({"summary": {"data": "x"}}));
        assert!(!session.has_unsaved_changes());
        assert!(session.pending_diff().is_empty());
    }

    #[test]
    fn test_edit_reports_pending_diff() {
        let session = EditSession::new(json!({"summary": {"data": "x"}}))
            .edit(json!({"summary": {"data": "y"}}));
        assert!(session.has_unsaved_changes());
        assert_eq!(session.pending_diff().len(), 1);
        assert_eq!(session.baseline, json!({"summary": {"data": "x"}}));

        let reverted = session.edit(json!({"summary": {"data": "x"}}));
        assert!(!reverted.has_unsaved_changes());
    }

    #[test]
    fn test_key_order_is_not_a_change() {
        let a: Value = serde_json::from_str(r#"{"a": 1, "b": {"c": 2, "d": 3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b": {"d": 3, "c": 2}, "a": 1}"#).unwrap();
        assert!(!has_unsaved_changes(&a, &b));
    }

    #[test]
    fn test_array_order_is_a_change() {
        assert!(has_unsaved_changes(
            &json!({"skills": {"data": ["b", "a"]}}),
            &json!({"skills": {"data": ["a", "b"]}})
        ));
    }
}
