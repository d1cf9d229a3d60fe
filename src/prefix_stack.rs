//! Scope-stacked prefix/URI mapping, pushed and popped by tree depth (C1).
//!
//! Two independent [`PrefixStack`] instances are used by the canonicalizer:
//! `declared`, keyed by prefix and holding the in-scope URI, and `used`,
//! keyed either by prefix (non-sequential mode) or by URI (sequential mode)
//! and holding the value already exposed for that key. Both need identical
//! push/pop-by-depth behavior, hence one generic type.

use std::collections::HashMap;

/// A map from string key to a depth-tagged stack of values.
///
/// `define` pushes a new top value recorded under the depth it was pushed
/// at; `pop_level` removes every entry — across every key — that was pushed
/// at a given depth, in LIFO order per key. Depths may be negative, which is
/// how ancestor namespace declarations are seeded before the first element
/// of a subtree is visited.
#[derive(Debug, Default)]
pub struct PrefixStack {
    values: HashMap<String, Vec<String>>,
    by_depth: HashMap<i64, Vec<String>>,
}

impl PrefixStack {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            by_depth: HashMap::new(),
        }
    }

    /// Pushes `value` onto `key`'s stack, recording that the push happened
    /// at `depth`.
    pub fn define(&mut self, key: &str, value: &str, depth: i64) {
        self.values
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        self.by_depth
            .entry(depth)
            .or_default()
            .push(key.to_string());
    }

    /// The current top-of-stack value for `key`, if any entry is in scope.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|stack| stack.last())
            .map(String::as_str)
    }

    /// Pops every entry pushed at `depth`, restoring each affected key's
    /// stack to its pre-push state.
    pub fn pop_level(&mut self, depth: i64) {
        if let Some(keys) = self.by_depth.remove(&depth) {
            for key in keys {
                if let Some(stack) = self.values.get_mut(&key) {
                    stack.pop();
                }
            }
        }
    }
}
