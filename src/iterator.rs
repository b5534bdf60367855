//! Budget-bounded traversal of input trees.
//!
//! Conditions read their targets through [`TargetIterator`], which walks a
//! root value (optionally descending through a nested key path first) and
//! lazily yields qualified scalar leaves or map keys. Traversal uses an
//! explicit work stack so input shape cannot grow the call stack, and the
//! depth/size budgets from [`Limits`] truncate pathological trees silently.

use crate::limits::Limits;
use crate::value::Value;

/// Whether a condition matches on scalar values or on map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    #[default]
    Values,
    Keys,
}

/// A leaf produced by traversal: either a scalar value or a map key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaf<'a> {
    Value(&'a Value),
    Key(&'a str),
}

impl<'a> Leaf<'a> {
    /// Render the leaf as the candidate string handed to an operator.
    pub fn to_candidate(self, max_string_length: usize) -> Option<String> {
        match self {
            Leaf::Value(v) => v.to_scalar_string(max_string_length),
            Leaf::Key(k) => Value::String(k.to_string()).to_scalar_string(max_string_length),
        }
    }
}

enum StackItem<'a> {
    Node {
        value: &'a Value,
        path: Vec<String>,
        depth: usize,
    },
    KeyLeaf {
        key: &'a str,
        path: Vec<String>,
    },
}

/// Lazy, restartable-per-invocation iterator over the leaves of one target.
///
/// Yields `(leaf, key_path)` pairs in declaration order. Sub-objects whose
/// path matches an excluded path (prefix semantics) are skipped together
/// with their subtree.
pub struct TargetIterator<'a> {
    stack: Vec<StackItem<'a>>,
    limits: Limits,
    excluded: &'a [Vec<String>],
    source: DataSource,
}

fn is_excluded(excluded: &[Vec<String>], path: &[String]) -> bool {
    excluded
        .iter()
        .any(|e| path.len() >= e.len() && &path[..e.len()] == e.as_slice())
}

impl<'a> TargetIterator<'a> {
    /// Build an iterator over `root`, first descending through `key_path`.
    /// A missing path segment yields an empty iteration.
    pub fn new(
        root: &'a Value,
        key_path: &[String],
        source: DataSource,
        limits: Limits,
        excluded: &'a [Vec<String>],
    ) -> Self {
        let mut value = root;
        let mut path = Vec::with_capacity(key_path.len());
        for segment in key_path {
            match value.get(segment) {
                Some(child) => {
                    value = child;
                    path.push(segment.clone());
                }
                None => {
                    return Self { stack: Vec::new(), limits, excluded, source };
                }
            }
        }

        let stack = if is_excluded(excluded, &path) {
            Vec::new()
        } else {
            vec![StackItem::Node { value, path, depth: 0 }]
        };
        Self { stack, limits, excluded, source }
    }

    fn push_children(&mut self, value: &'a Value, path: &[String], depth: usize) {
        if depth >= self.limits.max_container_depth {
            return;
        }
        match value {
            Value::Array(items) => {
                let visible = items.len().min(self.limits.max_container_size);
                for (i, child) in items[..visible].iter().enumerate().rev() {
                    let mut child_path = path.to_vec();
                    child_path.push(i.to_string());
                    self.stack.push(StackItem::Node {
                        value: child,
                        path: child_path,
                        depth: depth + 1,
                    });
                }
            }
            Value::Map(entries) => {
                let visible = entries.len().min(self.limits.max_container_size);
                for (key, child) in entries[..visible].iter().rev() {
                    let mut child_path = path.to_vec();
                    child_path.push(key.clone());
                    self.stack.push(StackItem::Node {
                        value: child,
                        path: child_path.clone(),
                        depth: depth + 1,
                    });
                    if self.source == DataSource::Keys {
                        self.stack.push(StackItem::KeyLeaf { key, path: child_path });
                    }
                }
            }
            _ => {}
        }
    }
}

impl<'a> Iterator for TargetIterator<'a> {
    type Item = (Leaf<'a>, Vec<String>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(item) = self.stack.pop() {
            match item {
                StackItem::KeyLeaf { key, path } => {
                    if is_excluded(self.excluded, &path) {
                        continue;
                    }
                    return Some((Leaf::Key(key), path));
                }
                StackItem::Node { value, path, depth } => {
                    if is_excluded(self.excluded, &path) {
                        continue;
                    }
                    if value.is_container() {
                        self.push_children(value, &path, depth);
                        continue;
                    }
                    if self.source == DataSource::Values && value.is_scalar() {
                        return Some((Leaf::Value(value), path));
                    }
                }
            }
        }
        None
    }
}
