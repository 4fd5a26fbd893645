//! Ad-hoc variable maps for templates and encoders.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed map of arbitrary values.
///
/// Serializes as a plain JSON object, so it can be handed to a template as
/// its context or to an encoder as the response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vars(Map<String, Value>);

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, returning the map for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Vars {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl From<Vars> for Value {
    fn from(value: Vars) -> Self {
        Value::Object(value.0)
    }
}

/// Build a [`Vars`] map from `key => value` pairs.
///
/// Values follow `serde_json::json!` syntax; wrap anything longer than a
/// single token in parentheses.
///
/// ```
/// let v = minions_core::vars! { "title" => "Home", "count" => 3 };
/// assert_eq!(v.len(), 2);
/// ```
#[macro_export]
macro_rules! vars {
    () => {
        $crate::Vars::new()
    };
    ($($key:expr => $value:tt),+ $(,)?) => {{
        let mut vars = $crate::Vars::new();
        $(
            vars.insert($key, $crate::__private::json!($value));
        )+
        vars
    }};
}
