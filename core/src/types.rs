//! Domain DTOs for the todo catalog and the synchronized store.
//!
//! # Design
//! Field names follow the remote catalog's JSON schema (`todo`, `userId`),
//! with serde renames keeping the Rust names readable. The same types are
//! used for the store snapshot at path `todos`, which starts life as the
//! full catalog response and accumulates locally added todos as numeric
//! sibling keys next to `limit`/`skip`/`total`/`todos`.
//! `TodoPage::from_snapshot` merges both shapes back into one ordered list.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique within one list; locally created todos get `max(existing) + 1`.
    pub id: i64,
    /// Free-form text. Emptiness is rejected at the UI boundary, not here.
    #[serde(rename = "todo")]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Assigned once at creation, unique among the todos known at that
    /// moment. Carries no other meaning.
    #[serde(rename = "userId")]
    pub owner_tag: u32,
}

/// The published list value: catalog paging metadata plus the ordered todos.
///
/// `limit`, `skip` and `total` are informational, copied from the remote
/// response when present and 0 otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPage {
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub todos: Vec<Todo>,
}

impl TodoPage {
    /// Parses a store snapshot into a page.
    ///
    /// Accepts the seeded response object (possibly with numeric sibling
    /// keys holding locally added todos, appended in numeric key order) or
    /// a bare list. Null children are skipped, matching a store that marks
    /// removals as null before pruning.
    pub fn from_snapshot(value: &Value) -> serde_json::Result<Self> {
        use serde::de::Error as _;

        match value {
            Value::Array(_) => {
                let todos: Vec<Todo> = serde_json::from_value(value.clone())?;
                Ok(Self {
                    todos,
                    ..Self::default()
                })
            }
            Value::Object(map) => {
                let meta = |key: &str| map.get(key).and_then(Value::as_i64).unwrap_or(0);

                let mut todos: Vec<Todo> = match map.get("todos") {
                    Some(nested) if !nested.is_null() => serde_json::from_value(nested.clone())?,
                    _ => Vec::new(),
                };

                let mut extras: Vec<(i64, &Value)> = map
                    .iter()
                    .filter_map(|(key, child)| key.parse::<i64>().ok().map(|n| (n, child)))
                    .filter(|(_, child)| !child.is_null())
                    .collect();
                extras.sort_by_key(|(key, _)| *key);
                for (_, child) in extras {
                    todos.push(serde_json::from_value(child.clone())?);
                }

                Ok(Self {
                    limit: meta("limit"),
                    skip: meta("skip"),
                    total: meta("total"),
                    todos,
                })
            }
            other => Err(serde_json::Error::custom(format!(
                "expected a todo list snapshot, found {other}"
            ))),
        }
    }
}
