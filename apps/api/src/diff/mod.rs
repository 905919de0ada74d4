//! Structural diffs between JSON values.
//!
//! A diff records only the branches that changed between two values. Objects
//! are merged key by key; arrays and scalars have no stable element identity
//! here, so any change replaces them wholesale. Removal is an explicit
//! `remove` op, never an absent or `null` value, so literal `null` data
//! survives a round trip.
//!
//! Both `create_diff` and `apply_diff` are pure and synchronous.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("malformed diff: {0}")]
    Malformed(String),
}

/// Changed keys of one object level, keyed by field name.
pub type Changes = BTreeMap<String, FieldChange>;

/// The change recorded for a single object key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldChange {
    /// Key added, or its value replaced (type change, scalar or array change).
    Set { value: Value },
    /// Key existed in the base and is gone in the update.
    Remove,
    /// Both sides are objects; only the nested changes are kept.
    Merge { changes: Changes },
}

/// A diff between two whole JSON values.
///
/// Stored as `{"op":"merge","changes":{..}}` or `{"op":"replace","value":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Diff {
    Merge { changes: Changes },
    /// Roots are not both objects (e.g. `null` base) and they differ.
    Replace { value: Value },
}

impl Default for Diff {
    fn default() -> Self {
        Diff::Merge {
            changes: Changes::new(),
        }
    }
}

impl Diff {
    /// True when applying this diff changes nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Diff::Merge { changes } if changes.is_empty())
    }

    /// Number of changed top-level keys (1 for a whole-value replacement).
    pub fn len(&self) -> usize {
        match self {
            Diff::Merge { changes } => changes.len(),
            Diff::Replace { .. } => 1,
        }
    }

    /// Strictly decodes a diff as persisted. `null` is rejected rather than
    /// read as an empty diff.
    pub fn from_value(value: &Value) -> Result<Self, DiffError> {
        if value.is_null() {
            return Err(DiffError::Malformed("diff is null".to_string()));
        }
        Diff::deserialize(value).map_err(|e| DiffError::Malformed(e.to_string()))
    }

    /// JSON form as persisted in the version log.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Computes the diff that turns `base` into `updated`.
///
/// ```text
/// create_diff({"a":1,"b":2}, {"a":1,"c":3})
///   => {"op":"merge","changes":{"b":{"op":"remove"},"c":{"op":"set","value":3}}}
/// ```
pub fn create_diff(base: &Value, updated: &Value) -> Diff {
    match (base, updated) {
        (Value::Object(base), Value::Object(updated)) => Diff::Merge {
            changes: diff_objects(base, updated),
        },
        _ if base == updated => Diff::default(),
        _ => Diff::Replace {
            value: updated.clone(),
        },
    }
}

fn diff_objects(base: &Map<String, Value>, updated: &Map<String, Value>) -> Changes {
    let mut changes = Changes::new();

    for (key, old) in base {
        match updated.get(key) {
            None => {
                changes.insert(key.clone(), FieldChange::Remove);
            }
            Some(new) => {
                if let Some(change) = diff_field(old, new) {
                    changes.insert(key.clone(), change);
                }
            }
        }
    }

    for (key, new) in updated {
        if !base.contains_key(key) {
            changes.insert(key.clone(), FieldChange::Set { value: new.clone() });
        }
    }

    changes
}

fn diff_field(old: &Value, new: &Value) -> Option<FieldChange> {
    match (old, new) {
        (Value::Object(old), Value::Object(new)) => {
            let nested = diff_objects(old, new);
            // No-op keys never appear in a diff
            (!nested.is_empty()).then_some(FieldChange::Merge { changes: nested })
        }
        _ if old == new => None,
        _ => Some(FieldChange::Set { value: new.clone() }),
    }
}

/// Applies `diff` on top of `base` and returns the new value.
///
/// `base` is never mutated. The diff is not checked against the base it was
/// computed from: a nested merge landing on a missing or non-object value
/// treats that value as `{}`.
pub fn apply_diff(base: &Value, diff: &Diff) -> Value {
    apply_owned(base.clone(), diff)
}

/// Folds `apply_diff` over `diffs` in order, starting from `base`.
pub fn apply_diffs<'a>(base: &Value, diffs: impl IntoIterator<Item = &'a Diff>) -> Value {
    diffs
        .into_iter()
        .fold(base.clone(), |acc, diff| apply_owned(acc, diff))
}

fn apply_owned(base: Value, diff: &Diff) -> Value {
    match diff {
        Diff::Replace { value } => value.clone(),
        Diff::Merge { changes } if changes.is_empty() => base,
        Diff::Merge { changes } => Value::Object(merge_changes(base, changes)),
    }
}

fn merge_changes(base: Value, changes: &Changes) -> Map<String, Value> {
    let mut result = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for (key, change) in changes {
        match change {
            FieldChange::Set { value } => {
                result.insert(key.clone(), value.clone());
            }
            FieldChange::Remove => {
                result.remove(key);
            }
            FieldChange::Merge { changes } if changes.is_empty() => {}
            FieldChange::Merge { changes } => {
                let nested = result.remove(key).unwrap_or(Value::Null);
                result.insert(key.clone(), Value::Object(merge_changes(nested, changes)));
            }
        }
    }

    result
}
