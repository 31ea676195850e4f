//! Evaluation orchestrator
//!
//! Loads a deployed definition, selects the target decision, matches its
//! rules in declaration order, and shapes the matched set through the
//! table's hit policy. The engine holds no per-request state beyond the
//! stack; concurrent evaluations share the repository and nothing else.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use verdict_core::model::{Decision, DecisionTable, HitPolicy, Input, Output, Rule};
use verdict_core::Value;
use verdict_repository::{DefinitionRepository, RepositoryError};

use crate::error::EngineError;
use crate::hit_policy::{self, MatchedRule, OutputRow};
use crate::output::parse_output_value;
use crate::unary::evaluate_unary_test;

/// A request to evaluate a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub decision_key: String,
    /// Absent or zero means the latest deployed version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tenant_id: String,
}

/// The result of a decision evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    pub decision_key: String,
    pub decision_name: String,
    pub version: i32,
    pub outputs: Vec<OutputRow>,
    /// Ids of every matched rule, in rule-declaration order
    pub matched_rules: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
    pub duration_ns: i64,
}

/// The DMN evaluation engine.
pub struct Engine {
    repo: Arc<dyn DefinitionRepository>,
}

impl Engine {
    /// Create an engine over a definition repository.
    pub fn new(repo: Arc<dyn DefinitionRepository>) -> Self {
        Self { repo }
    }

    /// Evaluate a decision against the supplied variables.
    pub async fn evaluate(&self, req: &EvaluateRequest) -> Result<EvaluateResult, EngineError> {
        let start = Instant::now();

        let def = match req.version {
            Some(version) if version > 0 => {
                self.repo
                    .get_by_key_and_version(&req.decision_key, version, &req.tenant_id)
                    .await
            }
            _ => self.repo.get_by_key(&req.decision_key, &req.tenant_id).await,
        }
        .map_err(|err| match err {
            RepositoryError::NotFound { .. } => EngineError::NotFound(err.to_string()),
            other => EngineError::Repository(other),
        })?;

        // Match the decision by id, falling back to the first decision in
        // document order.
        let decision = def
            .parsed_model
            .decision(&req.decision_key)
            .or_else(|| def.parsed_model.decisions.first())
            .ok_or(EngineError::NoDecisions)?;

        let (outputs, matched_rules) = evaluate_decision(decision, &req.variables)?;

        debug!(
            decision_key = %def.key,
            version = def.version,
            matched = matched_rules.len(),
            "decision evaluated"
        );

        Ok(EvaluateResult {
            decision_key: def.key.clone(),
            decision_name: decision.name.clone(),
            version: def.version,
            outputs,
            matched_rules,
            evaluated_at: Utc::now(),
            duration_ns: start.elapsed().as_nanos() as i64,
        })
    }
}

fn evaluate_decision(
    decision: &Decision,
    variables: &HashMap<String, Value>,
) -> Result<(Vec<OutputRow>, Vec<String>), EngineError> {
    let table = decision
        .decision_table
        .as_ref()
        .ok_or(EngineError::LiteralExpressionUnsupported)?;

    evaluate_decision_table(table, variables)
}

fn evaluate_decision_table(
    table: &DecisionTable,
    variables: &HashMap<String, Value>,
) -> Result<(Vec<OutputRow>, Vec<String>), EngineError> {
    // The parser defaults an omitted hit policy to UNIQUE; tolerate an
    // empty string here as well for models built in code.
    let policy = if table.hit_policy.is_empty() {
        HitPolicy::Unique
    } else {
        HitPolicy::parse(&table.hit_policy)
            .ok_or_else(|| EngineError::UnsupportedHitPolicy(table.hit_policy.clone()))?
    };

    let mut matched = Vec::new();
    for rule in &table.rules {
        if let Some(outputs) = evaluate_rule(rule, &table.inputs, &table.outputs, variables)? {
            matched.push(MatchedRule {
                rule_id: rule.id.clone(),
                outputs,
            });

            if policy == HitPolicy::First {
                break;
            }
        }
    }

    let outputs = hit_policy::apply(policy, &matched, &table.aggregation)?;
    let rule_ids = matched.into_iter().map(|m| m.rule_id).collect();

    Ok((outputs, rule_ids))
}

/// Evaluate one rule: `Ok(None)` is a miss, `Ok(Some(row))` a match with
/// its parsed output values. A variable absent from the request is a miss,
/// not an error.
fn evaluate_rule(
    rule: &Rule,
    inputs: &[Input],
    outputs: &[Output],
    variables: &HashMap<String, Value>,
) -> Result<Option<OutputRow>, EngineError> {
    for (i, entry) in rule.input_entries.iter().enumerate() {
        let Some(input) = inputs.get(i) else {
            return Err(EngineError::EntryOutOfBounds {
                rule_id: rule.id.clone(),
                index: i,
            });
        };

        let Some(value) = variables.get(input.input_expression.text.trim()) else {
            return Ok(None);
        };

        match evaluate_unary_test(&entry.text, value) {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(source) => {
                return Err(EngineError::Rule {
                    rule_id: rule.id.clone(),
                    index: i,
                    source,
                })
            }
        }
    }

    let mut row = OutputRow::with_capacity(rule.output_entries.len());
    for (i, entry) in rule.output_entries.iter().enumerate() {
        let Some(output) = outputs.get(i) else {
            return Err(EngineError::EntryOutOfBounds {
                rule_id: rule.id.clone(),
                index: i,
            });
        };

        row.insert(
            output.output_key().to_string(),
            parse_output_value(&entry.text),
        );
    }

    Ok(Some(row))
}
