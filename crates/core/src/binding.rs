//! Form binding result: per-field validation failures.

use std::collections::HashMap;
use std::collections::hash_map;

use serde::{Deserialize, Serialize};

/// Validation failures collected while binding a submitted form to a struct.
///
/// Holds at most one message per field. An empty result means the binding
/// succeeded. Entries are only ever added or overwritten, never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingResult(HashMap<String, String>);

impl BindingResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the binding succeeded (no field has failed).
    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    /// Record a failure for `field`, replacing any earlier message.
    pub fn fail(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Copy every failure of `other` into this result.
    ///
    /// Fields present in both end up with `other`'s message.
    pub fn include(&mut self, other: &BindingResult) {
        for (field, message) in &other.0 {
            self.fail(field.clone(), message.clone());
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(field, message)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }
}

impl IntoIterator for BindingResult {
    type Item = (String, String);
    type IntoIter = hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<F, M> FromIterator<(F, M)> for BindingResult
where
    F: Into<String>,
    M: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (F, M)>>(iter: I) -> Self {
        let mut result = Self::new();
        for (field, message) in iter {
            result.fail(field, message);
        }
        result
    }
}
