// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Path-addressed JSON document tree.
//!
//! The tree mirrors what the remote database holds for the paths the client
//! listens on. Paths are `/`-separated key sequences; the empty path is the
//! root. The remote service never stores nulls or empty objects, so every
//! mutation ends with a prune pass that removes null entries and any object
//! nodes left empty.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Maximum object nesting depth supported by the prune pass.
///
/// Deeper trees are a documented limitation: [`DocumentTree::prune`] fails
/// closed instead of truncating.
pub const MAX_PRUNE_DEPTH: usize = 10;

/// Splits a path into its non-empty segments, so `/a//b` equals `a/b`.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// An owned JSON tree addressed by `/`-separated paths.
#[derive(Debug)]
pub struct DocumentTree {
    root: Value,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    /// Creates an empty tree (an object root with no entries).
    pub fn new() -> Self {
        DocumentTree {
            root: Value::Object(Map::new()),
        }
    }

    /// Returns the node at `path`, or `None` if any segment is absent.
    ///
    /// Lookup never creates missing nodes.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut node = &self.root;
        for segment in split_path(path) {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    /// Replaces the node at `path` with `value`, creating intermediate
    /// object nodes as needed. An empty path replaces the whole tree.
    ///
    /// Non-object values on the way to the target are overwritten by fresh
    /// objects. Always followed by a prune pass.
    pub fn replace_at(&mut self, path: &str, value: Value) -> Result<()> {
        let segments: Vec<&str> = split_path(path).collect();
        replace_in(&mut self.root, &segments, value);
        self.prune()
    }

    /// Applies `updates` as independent per-key overwrites below `path`.
    ///
    /// Each entry is a full replacement at `path + "/" + key`; this is NOT
    /// a recursive structural merge.
    pub fn merge_at(&mut self, path: &str, updates: Map<String, Value>) -> Result<()> {
        for (key, value) in updates {
            let target = format!("{path}/{key}");
            self.replace_at(&target, value)?;
        }
        Ok(())
    }

    /// Removes every null entry, then bottom-up every object left empty.
    ///
    /// Depth is checked before any mutation, so a tree nested deeper than
    /// [`MAX_PRUNE_DEPTH`] is left intact and an error is returned.
    pub fn prune(&mut self) -> Result<()> {
        if exceeds_depth(&self.root, MAX_PRUNE_DEPTH) {
            return Err(Error::TreeTooDeep {
                max_depth: MAX_PRUNE_DEPTH,
            });
        }
        prune_node(&mut self.root);
        Ok(())
    }

    /// The root node.
    pub fn root(&self) -> &Value {
        &self.root
    }
}

fn replace_in(node: &mut Value, segments: &[&str], value: Value) {
    match segments {
        [] => *node = value,
        [head, rest @ ..] => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry((*head).to_string()).or_insert(Value::Null);
                replace_in(child, rest, value);
            }
        }
    }
}

/// True if an object chain nests beyond `levels` (counting `node` as one).
fn exceeds_depth(node: &Value, levels: usize) -> bool {
    match node {
        Value::Object(map) => {
            if levels == 0 {
                return true;
            }
            map.values().any(|child| exceeds_depth(child, levels - 1))
        }
        _ => false,
    }
}

fn prune_node(node: &mut Value) {
    if let Value::Object(map) = node {
        for child in map.values_mut() {
            prune_node(child);
        }
        map.retain(|_, child| !child.is_null() && !is_empty_object(child));
    }
}

fn is_empty_object(node: &Value) -> bool {
    matches!(node, Value::Object(map) if map.is_empty())
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
