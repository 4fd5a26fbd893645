//! Functions available to every template.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::FunctionMap;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DictError {
    #[error("invalid dict call")]
    OddArguments(usize),

    #[error("dict keys must be strings")]
    NonStringKey { position: usize },
}

/// Floating-point quotient of two integers.
///
/// Division by zero follows IEEE-754 (`inf`, `-inf` or `NaN`).
pub fn divide(dividend: i64, divisor: i64) -> f64 {
    dividend as f64 / divisor as f64
}

/// Build a map from alternating key/value entries.
pub fn build_dict(values: &[Value]) -> Result<Map<String, Value>, DictError> {
    if values.len() % 2 != 0 {
        return Err(DictError::OddArguments(values.len()));
    }

    let mut dict = Map::new();
    for (i, pair) in values.chunks_exact(2).enumerate() {
        let Value::String(key) = &pair[0] else {
            return Err(DictError::NonStringKey { position: i * 2 });
        };
        dict.insert(key.clone(), pair[1].clone());
    }
    Ok(dict)
}

/// `div(dividend=7, divisor=2)`
fn div(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let dividend = integer_arg(args, "div", "dividend")?;
    let divisor = integer_arg(args, "div", "divisor")?;

    let quotient = divide(dividend, divisor);
    // JSON numbers cannot hold inf/NaN; hand those over as their display form.
    Ok(Number::from_f64(quotient)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(quotient.to_string())))
}

/// `dict(pairs=["title", "Home", "count", 3])`
fn dict(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let pairs: &[Value] = match args.get("pairs") {
        Some(Value::Array(pairs)) => pairs.as_slice(),
        Some(_) => return Err(tera::Error::msg("dict: `pairs` must be an array")),
        None => &[],
    };

    build_dict(pairs)
        .map(Value::Object)
        .map_err(|e| tera::Error::msg(e.to_string()))
}

fn integer_arg(args: &HashMap<String, Value>, func: &str, name: &str) -> tera::Result<i64> {
    args.get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| tera::Error::msg(format!("{func}: `{name}` must be an integer")))
}

/// The functions every template store starts with.
pub fn builtins() -> FunctionMap {
    let mut map: FunctionMap = HashMap::new();
    map.insert("div".to_string(), Arc::new(div));
    map.insert("dict".to_string(), Arc::new(dict));
    map
}

/// Adapter so shared function objects can be registered with every fresh
/// `tera::Tera` instance.
pub(crate) struct Shared(pub Arc<dyn tera::Function>);

impl tera::Function for Shared {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        self.0.call(args)
    }

    fn is_safe(&self) -> bool {
        self.0.is_safe()
    }
}
