//! FEEL unary-test interpreter
//!
//! Interprets one input-cell expression against one typed value. This is a
//! hand-written ordered-alternation interpreter over the unary-test subset
//! of FEEL, not a full parser; the order of the alternatives below is the
//! contract callers rely on (earlier matches win):
//!
//! 1. empty / `-` wildcard
//! 2. quoted string literal
//! 3. range `[10..20)` (the expression contains `..`)
//! 4. comparator prefix on a numeric value (`<=`, `>=`, `<`, `>`, `=`)
//! 5. comma list `"red","green"`
//! 6. exact match (numeric when both sides parse, string otherwise)

use verdict_core::Value;

use crate::error::EvalError;

/// Evaluate a unary test expression against a value.
pub fn evaluate_unary_test(expression: &str, value: &Value) -> Result<bool, EvalError> {
    let expr = expression.trim();

    // Wildcard: any value matches
    if expr.is_empty() || expr == "-" {
        return Ok(true);
    }

    // Quoted string literal: exact match on the string rendering
    if expr.len() >= 2 && expr.starts_with('"') && expr.ends_with('"') {
        let expected = &expr[1..expr.len() - 1];
        return Ok(value.render() == expected);
    }

    // Range: [10..20], (10..20], ]10..20[, ...
    if expr.contains("..") {
        let Some(num) = value.as_f64() else {
            return Err(EvalError::RangeRequiresNumeric);
        };
        return evaluate_range(expr, num);
    }

    // Comparator prefix; applies only when the value is numeric, longest
    // operator first so `<=` is not read as `<`
    if let Some(num) = value.as_f64() {
        type Compare = fn(f64, f64) -> bool;
        const COMPARATORS: [(&str, Compare); 5] = [
            ("<=", |v, t| v <= t),
            (">=", |v, t| v >= t),
            ("<", |v, t| v < t),
            (">", |v, t| v > t),
            ("=", |v, t| v == t),
        ];

        for (prefix, compare) in COMPARATORS {
            if let Some(rest) = expr.strip_prefix(prefix) {
                return Ok(compare(num, parse_number(rest)?));
            }
        }
    }

    // Comma list: the rendering must equal one of the elements
    if expr.contains(',') {
        let rendered = value.render();
        return Ok(expr
            .split(',')
            .any(|item| item.trim().trim_matches('"') == rendered));
    }

    // Exact match: numeric when both sides are numbers, string otherwise
    if let Some(num) = value.as_f64() {
        if let Ok(expected) = expr.parse::<f64>() {
            return Ok(num == expected);
        }
    }

    Ok(value.render() == expr)
}

/// Evaluate a range expression like `[10..20]` or `]10..20[` against a
/// numeric value. `[`/`]` at the matching end are inclusive; `(`/`)` and
/// reversed square brackets are exclusive.
fn evaluate_range(expr: &str, value: f64) -> Result<bool, EvalError> {
    let left_inclusive = expr.starts_with('[');
    let right_inclusive = expr.ends_with(']');

    let inner = expr.trim_matches(|c| matches!(c, '[' | ']' | '(' | ')'));

    let Some((low, high)) = inner.split_once("..") else {
        return Err(EvalError::InvalidRange(expr.to_string()));
    };
    if high.contains("..") {
        return Err(EvalError::InvalidRange(expr.to_string()));
    }

    let lower = parse_number(low)?;
    let upper = parse_number(high)?;

    let above_lower = if left_inclusive {
        value >= lower
    } else {
        value > lower
    };
    let below_upper = if right_inclusive {
        value <= upper
    } else {
        value < upper
    };

    Ok(above_lower && below_upper)
}

fn parse_number(text: &str) -> Result<f64, EvalError> {
    let text = text.trim();
    text.parse::<f64>()
        .map_err(|_| EvalError::InvalidNumber(text.to_string()))
}
