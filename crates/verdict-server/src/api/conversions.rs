//! JSON -> typed value conversion
//!
//! Decision variables range over scalars. Arrays and objects are rejected
//! here, at the boundary, so the engine only ever sees typed values.

use std::collections::HashMap;

use verdict_core::Value;

use crate::error::ApiError;

/// Convert one JSON value into a typed variable value.
pub fn json_to_value(name: &str, value: &serde_json::Value) -> Result<Value, ApiError> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Number(f))
            } else {
                Err(ApiError::InvalidRequest(format!(
                    "variable '{name}' is out of numeric range"
                )))
            }
        }
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            Err(ApiError::InvalidRequest(format!(
                "variable '{name}' must be a scalar (null, boolean, number, or string)"
            )))
        }
    }
}

/// Convert the whole variable map.
pub fn convert_variables(
    variables: &HashMap<String, serde_json::Value>,
) -> Result<HashMap<String, Value>, ApiError> {
    variables
        .iter()
        .map(|(name, value)| Ok((name.clone(), json_to_value(name, value)?)))
        .collect()
}
