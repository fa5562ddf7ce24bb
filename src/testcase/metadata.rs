//! Chainable per-test-case metadata (§4.7): tags, owners, and similar
//! free-form annotations a scenario's default metadata is merged into.

use std::collections::HashMap;

use serde_json::Value;

/// A `{key: value}` bag attached to a `TestCase`. Merging combines arrays by
/// concatenation and objects recursively, and otherwise lets the more
/// specific side (the test case over the scenario default) win — so a test
/// case can add a `tags: ["slow"]` on top of a scenario-wide `tags:
/// ["integration"]` and end up with both, while overriding a scalar field
/// like `owner` outright.
#[derive(Debug, Clone, Default)]
pub struct TestCaseMetadata(HashMap<String, Value>);

impl TestCaseMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// `.id(value)`: a stable identifier for the test case, distinct from
    /// its display `name` (e.g. a case number from an external test plan).
    pub fn id(self, value: impl Into<String>) -> Self {
        self.with("id", Value::String(value.into()))
    }

    /// `.epic(value)`: the top-level grouping a test case belongs to.
    pub fn epic(self, value: impl Into<String>) -> Self {
        self.with("epic", Value::String(value.into()))
    }

    /// `.feature(value)`: the feature under test.
    pub fn feature(self, value: impl Into<String>) -> Self {
        self.with("feature", Value::String(value.into()))
    }

    /// `.story(value)`: the user story a test case exercises.
    pub fn story(self, value: impl Into<String>) -> Self {
        self.with("story", Value::String(value.into()))
    }

    /// `.severity(value)`: e.g. `"blocker"`, `"critical"`, `"minor"`.
    pub fn severity(self, value: impl Into<String>) -> Self {
        self.with("severity", Value::String(value.into()))
    }

    /// `.tag(value)`: appends one tag. Merges by array concatenation with
    /// whatever `tags` a scenario default or an earlier call already set.
    pub fn tag(self, value: impl Into<String>) -> Self {
        self.tags([value.into()])
    }

    /// `.tags(values)`: appends every tag in `values` in one call.
    pub fn tags(self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.append_to_array("tags", values)
    }

    /// `.issue(value)`: links one tracked issue id.
    pub fn issue(self, value: impl Into<String>) -> Self {
        self.issues([value.into()])
    }

    /// `.issues(values)`: links every tracked issue id in `values`.
    pub fn issues(self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.append_to_array("issues", values)
    }

    /// `.description(value)`: free-form human-readable summary.
    pub fn description(self, value: impl Into<String>) -> Self {
        self.with("description", Value::String(value.into()))
    }

    /// `.label(key, value)`: sets one entry in the `labels` object, merging
    /// recursively with whatever `labels` already exist (mirroring `merge`'s
    /// object semantics).
    pub fn label(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut labels = match self.0.get("labels") {
            Some(Value::Object(existing)) => existing.clone(),
            _ => serde_json::Map::new(),
        };
        labels.insert(key.into(), Value::String(value.into()));
        self.with("labels", Value::Object(labels))
    }

    fn append_to_array(
        self,
        key: &str,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut array = match self.0.get(key) {
            Some(Value::Array(existing)) => existing.clone(),
            _ => Vec::new(),
        };
        array.extend(values.into_iter().map(|v| Value::String(v.into())));
        self.with(key, Value::Array(array))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &HashMap<String, Value> {
        &self.0
    }

    /// Merges `other` on top of `self`, returning the combined metadata.
    /// `other` is the more specific side (e.g. a test case's own metadata
    /// merged over its scenario's defaults).
    pub fn merge(&self, other: &TestCaseMetadata) -> TestCaseMetadata {
        let mut merged = self.0.clone();
        for (key, incoming) in &other.0 {
            match merged.remove(key) {
                Some(existing) => {
                    merged.insert(key.clone(), merge_value(existing, incoming.clone()));
                }
                None => {
                    merged.insert(key.clone(), incoming.clone());
                }
            }
        }
        TestCaseMetadata(merged)
    }
}

fn merge_value(existing: Value, incoming: Value) -> Value {
    match (existing, incoming) {
        (Value::Array(mut a), Value::Array(b)) => {
            a.extend(b);
            Value::Array(a)
        }
        (Value::Object(mut a), Value::Object(b)) => {
            for (k, v) in b {
                let merged = match a.remove(&k) {
                    Some(existing) => merge_value(existing, v),
                    None => v,
                };
                a.insert(k, merged);
            }
            Value::Object(a)
        }
        (_, incoming) => incoming,
    }
}
