//! Output-expression evaluation
//!
//! Output cells carry FEEL literal expressions. Only literals are
//! interpreted here: strings, booleans, and numbers; anything else is
//! passed through as a raw string.

use verdict_core::Value;

/// Parse an output-cell expression into a typed value.
///
/// In order: empty -> null, `"..."` -> string, `true`/`false` -> bool,
/// numeric literal -> integer when whole, float otherwise, anything else
/// -> the raw string.
pub fn parse_output_value(expression: &str) -> Value {
    let expr = expression.trim();

    if expr.is_empty() {
        return Value::Null;
    }

    if expr.len() >= 2 && expr.starts_with('"') && expr.ends_with('"') {
        return Value::String(expr[1..expr.len() - 1].to_string());
    }

    if expr == "true" {
        return Value::Bool(true);
    }
    if expr == "false" {
        return Value::Bool(false);
    }

    if let Ok(num) = expr.parse::<f64>() {
        if num.fract() == 0.0 && num >= i64::MIN as f64 && num <= i64::MAX as f64 {
            return Value::Int(num as i64);
        }
        return Value::Number(num);
    }

    Value::String(expr.to_string())
}
