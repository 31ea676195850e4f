//! DMN model validation
//!
//! Structural checks on a parsed [`Definitions`] tree plus a cycle check on
//! the decision requirement graph. The validator never stops early: one
//! pass accumulates every finding so a client can fix them all in a single
//! round-trip. Field names use a dotted path convention, e.g.
//! `decision[loanLevel].decisionTable.rules[2].inputEntries`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use verdict_core::model::{Aggregation, Decision, DecisionTable, Definitions, HitPolicy};

/// A single field-scoped validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// DMN model validator
#[derive(Debug, Default)]
pub struct Validator;

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a definitions tree, returning every finding in document
    /// order. An empty result means the model is deployable.
    pub fn validate(&self, defs: &Definitions) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if defs.id.is_empty() {
            errors.push(ValidationError::new(
                "definitions.id",
                "definitions must have an id",
            ));
        }

        if defs.decisions.is_empty() {
            errors.push(ValidationError::new(
                "definitions.decisions",
                "definitions must have at least one decision",
            ));
        }

        let mut seen_ids = HashSet::new();

        for decision in &defs.decisions {
            if decision.id.is_empty() {
                errors.push(ValidationError::new(
                    "decision.id",
                    "decision must have an id",
                ));
                continue;
            }

            if !seen_ids.insert(decision.id.clone()) {
                errors.push(ValidationError::new(
                    format!("decision[{}].id", decision.id),
                    "duplicate decision id",
                ));
            }

            self.validate_decision(decision, &mut errors);
        }

        for input in &defs.input_data {
            if input.id.is_empty() {
                errors.push(ValidationError::new(
                    "inputData.id",
                    "inputData must have an id",
                ));
                continue;
            }

            if !seen_ids.insert(input.id.clone()) {
                errors.push(ValidationError::new(
                    format!("inputData[{}].id", input.id),
                    "duplicate id",
                ));
            }
        }

        if let Some(cycle) = check_cyclic_dependencies(defs) {
            errors.push(cycle);
        }

        errors
    }

    fn validate_decision(&self, decision: &Decision, errors: &mut Vec<ValidationError>) {
        let prefix = format!("decision[{}]", decision.id);

        if decision.decision_table.is_none() && decision.literal_expression.is_none() {
            errors.push(ValidationError::new(
                prefix,
                "decision must have either a decisionTable or literalExpression",
            ));
            return;
        }

        if let Some(table) = &decision.decision_table {
            self.validate_decision_table(table, &prefix, errors);
        }

        if let Some(literal) = &decision.literal_expression {
            if literal.text.is_empty() {
                errors.push(ValidationError::new(
                    format!("{prefix}.literalExpression.text"),
                    "literal expression must have text",
                ));
            }
        }
    }

    fn validate_decision_table(
        &self,
        table: &DecisionTable,
        prefix: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let prefix = format!("{prefix}.decisionTable");

        if !table.hit_policy.is_empty() && HitPolicy::parse(&table.hit_policy).is_none() {
            errors.push(ValidationError::new(
                format!("{prefix}.hitPolicy"),
                format!("invalid hit policy: {}", table.hit_policy),
            ));
        }

        if table.outputs.is_empty() {
            errors.push(ValidationError::new(
                format!("{prefix}.outputs"),
                "decision table must have at least one output",
            ));
        }

        for (i, rule) in table.rules.iter().enumerate() {
            if rule.input_entries.len() != table.inputs.len() {
                errors.push(ValidationError::new(
                    format!("{prefix}.rules[{i}].inputEntries"),
                    format!(
                        "expected {} input entries, got {}",
                        table.inputs.len(),
                        rule.input_entries.len()
                    ),
                ));
            }

            if rule.output_entries.len() != table.outputs.len() {
                errors.push(ValidationError::new(
                    format!("{prefix}.rules[{i}].outputEntries"),
                    format!(
                        "expected {} output entries, got {}",
                        table.outputs.len(),
                        rule.output_entries.len()
                    ),
                ));
            }
        }

        if table.hit_policy == HitPolicy::Collect.as_str()
            && !table.aggregation.is_empty()
            && Aggregation::parse(&table.aggregation).is_none()
        {
            errors.push(ValidationError::new(
                format!("{prefix}.aggregation"),
                format!("invalid aggregation: {}", table.aggregation),
            ));
        }
    }
}

/// Three-state DFS colouring over `requiredDecision` edges. Reports at most
/// one cycle per validation pass, naming the decision from which the cycle
/// was first observed.
fn check_cyclic_dependencies(defs: &Definitions) -> Option<ValidationError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Colour {
        OnStack,
        Done,
    }

    let graph: HashMap<&str, Vec<&str>> = defs
        .decisions
        .iter()
        .map(|d| {
            let deps = d
                .information_requirements
                .iter()
                .filter_map(|req| req.required_decision.as_ref())
                .map(|dep| dep.target_id())
                .collect();
            (d.id.as_str(), deps)
        })
        .collect();

    fn visit<'a>(
        node: &'a str,
        graph: &HashMap<&'a str, Vec<&'a str>>,
        colours: &mut HashMap<&'a str, Colour>,
    ) -> bool {
        match colours.get(node) {
            Some(Colour::OnStack) => return true,
            Some(Colour::Done) => return false,
            None => {}
        }

        colours.insert(node, Colour::OnStack);
        if let Some(deps) = graph.get(node) {
            for dep in deps {
                if visit(dep, graph, colours) {
                    return true;
                }
            }
        }
        colours.insert(node, Colour::Done);
        false
    }

    let mut colours = HashMap::new();
    for decision in &defs.decisions {
        if visit(decision.id.as_str(), &graph, &mut colours) {
            return Some(ValidationError::new(
                "decisions",
                format!(
                    "cyclic dependency detected involving decision: {}",
                    decision.id
                ),
            ));
        }
    }

    None
}
