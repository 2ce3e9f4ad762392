// src/dag/context.rs

//! Run-scoped, monotonic key/value store.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::dag::task::Values;

/// Values produced so far in a run, keyed by provide key.
///
/// Keys are only ever added: once set, a key is never overwritten or
/// removed. The scheduler is the only writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Project the context onto `keys`. Missing keys are left out.
    pub fn project<'a>(&self, keys: impl IntoIterator<Item = &'a String>) -> Values {
        keys.into_iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }

    /// Merge values whose keys have already been checked to be new.
    pub(crate) fn merge_validated(&mut self, values: Values) {
        for (key, value) in values {
            self.values.entry(key).or_insert(value);
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl From<Values> for Context {
    fn from(values: Values) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
