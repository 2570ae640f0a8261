//! Path-addressed synchronized document store.
//!
//! # Design
//! `SyncStore` models the realtime database the app persists into: a JSON
//! tree addressed by `/`-separated paths, with asynchronous one-shot reads,
//! writes and deletes. Local caching and replication to a remote replica
//! are properties of a store implementation and opaque to callers; no
//! read-modify-write atomicity is offered across calls.
//!
//! `MemoryStore` is the in-process implementation used by tests and as a
//! local store. Its path semantics follow the replicated store it stands in
//! for: writes create intermediate objects on demand, a numeric segment
//! under a list addresses an element, deleting a list element compacts the
//! remaining positions, and deleting an absent path succeeds as a no-op.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::SyncError;

/// Asynchronous key-value document store addressed by path segments.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// One-shot read of the subtree at `path`. Absent paths and explicit
    /// nulls yield `Ok(None)`.
    async fn read(&self, path: &str) -> Result<Option<Value>, SyncError>;

    /// Writes `value` at `path`, creating intermediate nodes as needed.
    async fn write(&self, path: &str, value: Value) -> Result<(), SyncError>;

    /// Deletes the value at `path`. Deleting an absent path is a no-op.
    async fn delete(&self, path: &str) -> Result<(), SyncError>;
}

/// In-memory [`SyncStore`] over a single JSON tree.
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: RwLock<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Value::Null),
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn set_at(node: &mut Value, segs: &[&str], value: Value) -> Result<(), String> {
    let seg = segs[0];
    // Scalars and nulls give way to an object so writes can deepen the tree.
    if !matches!(node, Value::Object(_) | Value::Array(_)) {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => {
            if segs.len() == 1 {
                map.insert(seg.to_string(), value);
                Ok(())
            } else {
                let child = map.entry(seg.to_string()).or_insert(Value::Null);
                set_at(child, &segs[1..], value)
            }
        }
        Value::Array(items) => {
            let index: usize = seg
                .parse()
                .map_err(|_| format!("non-numeric key `{seg}` under a list"))?;
            if segs.len() == 1 {
                match index.cmp(&items.len()) {
                    Ordering::Less => {
                        items[index] = value;
                        Ok(())
                    }
                    Ordering::Equal => {
                        items.push(value);
                        Ok(())
                    }
                    Ordering::Greater => Err(format!("index {index} is past the end of the list")),
                }
            } else {
                match items.get_mut(index) {
                    Some(child) => set_at(child, &segs[1..], value),
                    None => Err(format!("index {index} is past the end of the list")),
                }
            }
        }
        _ => Err("unsupported node type at this path".to_string()),
    }
}

fn remove_at(node: &mut Value, segs: &[&str]) -> Result<(), String> {
    let seg = segs[0];
    match node {
        Value::Object(map) => {
            if segs.len() == 1 {
                map.remove(seg);
                Ok(())
            } else {
                match map.get_mut(seg) {
                    Some(child) => remove_at(child, &segs[1..]),
                    None => Ok(()),
                }
            }
        }
        Value::Array(items) => {
            let index: usize = seg
                .parse()
                .map_err(|_| format!("non-numeric key `{seg}` under a list"))?;
            if segs.len() == 1 {
                if index < items.len() {
                    items.remove(index);
                }
                Ok(())
            } else {
                match items.get_mut(index) {
                    Some(child) => remove_at(child, &segs[1..]),
                    None => Ok(()),
                }
            }
        }
        // Nothing lives below a scalar; the path is absent.
        _ => Ok(()),
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, SyncError> {
        let root = self.root.read().await;
        let mut node = &*root;
        for seg in segments(path) {
            node = match node {
                Value::Object(map) => match map.get(seg) {
                    Some(child) => child,
                    None => return Ok(None),
                },
                Value::Array(items) => {
                    match seg.parse::<usize>().ok().and_then(|i| items.get(i)) {
                        Some(child) => child,
                        None => return Ok(None),
                    }
                }
                _ => return Ok(None),
            };
        }
        if node.is_null() {
            Ok(None)
        } else {
            Ok(Some(node.clone()))
        }
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), SyncError> {
        let mut root = self.root.write().await;
        let segs = segments(path);
        if segs.is_empty() {
            *root = value;
            return Ok(());
        }
        set_at(&mut *root, &segs, value).map_err(SyncError::StoreWrite)
    }

    async fn delete(&self, path: &str) -> Result<(), SyncError> {
        let mut root = self.root.write().await;
        let segs = segments(path);
        if segs.is_empty() {
            *root = Value::Null;
            return Ok(());
        }
        remove_at(&mut *root, &segs).map_err(SyncError::StoreDelete)
    }
}
