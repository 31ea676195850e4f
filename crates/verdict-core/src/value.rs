//! Runtime value types for decision evaluation
//!
//! `Value` is the type of both input variables and decision-table output
//! cells. It deliberately stays scalar: DMN decision-table cells range over
//! null, booleans, numbers, and strings. Integers and floats are kept apart
//! so that output values round-trip faithfully; comparisons coerce both to
//! f64 through [`Value::as_f64`].

use serde::{Deserialize, Serialize};

/// A typed scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null / absent value
    Null,
    /// Boolean value
    Bool(bool),
    /// Whole number
    Int(i64),
    /// Floating-point number
    Number(f64),
    /// String value
    String(String),
}

impl Value {
    /// Numeric coercion: both integer and floating-point values convert to
    /// a common f64 for comparison. Non-numeric values return `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether the value is numeric (integer or float).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Number(_))
    }

    /// The string rendering used by unary-test equality: booleans render as
    /// `true`/`false`, numbers through their `Display` form, strings
    /// verbatim.
    pub fn render(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
