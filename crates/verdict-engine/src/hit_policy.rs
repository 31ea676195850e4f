//! Hit-policy strategies
//!
//! A hit policy reduces the ordered list of matched rules to the final
//! output rows. The seven DMN policies are a closed set, dispatched off
//! the [`HitPolicy`] enum; COLLECT additionally aggregates numeric output
//! values when SUM/COUNT/MIN/MAX is declared.

use std::collections::HashMap;

use verdict_core::model::{Aggregation, HitPolicy};
use verdict_core::Value;

use crate::error::EngineError;

/// One output row: output column name (or id) -> value.
pub type OutputRow = HashMap<String, Value>;

/// A rule that matched the input, in rule-declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRule {
    pub rule_id: String,
    pub outputs: OutputRow,
}

/// Apply a hit policy to the matched rules.
///
/// `matched` is in rule-declaration order; policies that return multiple
/// rows preserve that order.
pub fn apply(
    policy: HitPolicy,
    matched: &[MatchedRule],
    aggregation: &str,
) -> Result<Vec<OutputRow>, EngineError> {
    match policy {
        HitPolicy::Unique => match matched.len() {
            0 => Ok(Vec::new()),
            1 => Ok(vec![matched[0].outputs.clone()]),
            n => Err(EngineError::HitPolicyViolation { matched: n }),
        },

        HitPolicy::First => Ok(first_match(matched)),

        // Strict DMN requires every match to carry identical outputs; this
        // engine returns the first without verifying.
        HitPolicy::Any => Ok(first_match(matched)),

        // Full DMN sorts by declared output-value order; without that
        // ordering the first match in rule order is returned.
        HitPolicy::Priority => Ok(first_match(matched)),

        HitPolicy::Collect => apply_collect(matched, aggregation),

        HitPolicy::RuleOrder => Ok(all_matches(matched)),

        // Defers to rule order until output-value ordering is captured at
        // parse time.
        HitPolicy::OutputOrder => Ok(all_matches(matched)),
    }
}

fn first_match(matched: &[MatchedRule]) -> Vec<OutputRow> {
    matched.first().map(|m| vec![m.outputs.clone()]).unwrap_or_default()
}

fn all_matches(matched: &[MatchedRule]) -> Vec<OutputRow> {
    matched.iter().map(|m| m.outputs.clone()).collect()
}

fn apply_collect(
    matched: &[MatchedRule],
    aggregation: &str,
) -> Result<Vec<OutputRow>, EngineError> {
    if matched.is_empty() {
        return Ok(Vec::new());
    }

    if aggregation.is_empty() {
        return Ok(all_matches(matched));
    }

    let Some(aggregation) = Aggregation::parse(aggregation) else {
        return Err(EngineError::UnsupportedAggregation(aggregation.to_string()));
    };

    match aggregation {
        Aggregation::Count => Ok(vec![single(
            "count",
            Value::Int(matched.len() as i64),
        )]),
        Aggregation::Sum => {
            let numbers = numeric_outputs(matched);
            if numbers.is_empty() {
                return Err(EngineError::AggregationRequiresNumeric { aggregation: "SUM" });
            }
            Ok(vec![single("sum", Value::Number(numbers.iter().sum()))])
        }
        Aggregation::Min => {
            let numbers = numeric_outputs(matched);
            let min = numbers.into_iter().fold(None, |min: Option<f64>, n| {
                Some(min.map_or(n, |m| m.min(n)))
            });
            match min {
                Some(min) => Ok(vec![single("min", Value::Number(min))]),
                None => Err(EngineError::AggregationRequiresNumeric { aggregation: "MIN" }),
            }
        }
        Aggregation::Max => {
            let numbers = numeric_outputs(matched);
            let max = numbers.into_iter().fold(None, |max: Option<f64>, n| {
                Some(max.map_or(n, |m| m.max(n)))
            });
            match max {
                Some(max) => Ok(vec![single("max", Value::Number(max))]),
                None => Err(EngineError::AggregationRequiresNumeric { aggregation: "MAX" }),
            }
        }
    }
}

/// Every numeric output value across every matched rule; non-numeric
/// outputs are skipped.
fn numeric_outputs(matched: &[MatchedRule]) -> Vec<f64> {
    matched
        .iter()
        .flat_map(|m| m.outputs.values())
        .filter_map(Value::as_f64)
        .collect()
}

fn single(key: &str, value: Value) -> OutputRow {
    OutputRow::from([(key.to_string(), value)])
}
