//! Sandbox Values
//!
//! The dynamic value model scripts compute with: null, booleans, numbers,
//! strings, lists, and maps. Values convert losslessly to and from JSON,
//! which is also how action results are serialized back to the model.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ScriptError, ScriptResult};

/// A dynamically-typed sandbox value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Truthiness: null, false, 0, "" and empty containers are falsy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
        }
    }

    /// Require a string, with a caller-supplied role for the message.
    pub fn as_str(&self, what: &str) -> ScriptResult<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(ScriptError::runtime(format!(
                "{what} must be a string, got {}",
                other.type_name()
            ))),
        }
    }

    /// Require a number, with a caller-supplied role for the message.
    pub fn as_num(&self, what: &str) -> ScriptResult<f64> {
        match self {
            Value::Num(n) => Ok(*n),
            other => Err(ScriptError::runtime(format!(
                "{what} must be a number, got {}",
                other.type_name()
            ))),
        }
    }

    /// Convert to a serde_json value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Num(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Build from a serde_json value.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Num(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Serialize for feedback to the model.
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Display renders the bare content: strings unquoted, numbers without a
/// trailing `.0`, containers as JSON. Used by `str()` and concatenation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::List(_) | Value::Map(_) => write!(f, "{}", self.to_json_string()),
        }
    }
}
