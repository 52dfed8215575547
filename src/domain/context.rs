//! Request-scoped correlation values carried alongside log calls.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable bag of correlation values (correlation id, workflow id, ...).
///
/// Cloning is an `Arc` bump, so the throttle can keep the first-seen context
/// of a bucket without copying it. [`Context::with_value`] returns a new
/// context and leaves the receiver untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: Arc<BTreeMap<String, String>>,
}

impl Context {
    /// An empty context.
    pub fn background() -> Self {
        Self::default()
    }

    /// Return a copy of this context with `key` set to `value`.
    pub fn with_value(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut values = Arc::clone(&self.values);
        Arc::make_mut(&mut values).insert(key.into(), value.into());
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Iterate values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
