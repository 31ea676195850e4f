//! Typed representation of a DMN `definitions` tree
//!
//! The model mirrors the DMN 1.3 XML structure for the subset this engine
//! evaluates: decisions backed by decision tables (literal expressions are
//! carried but not evaluated), input data, and the information requirements
//! linking them. The tree serializes to camelCase JSON for storage and for
//! the `/parsed` endpoint.

use serde::{Deserialize, Serialize};

/// Root element of a DMN model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Definitions {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub expression_language: String,
    pub decisions: Vec<Decision>,
    pub input_data: Vec<InputData>,
    pub business_knowledge_models: Vec<BusinessKnowledgeModel>,
}

impl Definitions {
    /// Look up a decision by id.
    pub fn decision(&self, id: &str) -> Option<&Decision> {
        self.decisions.iter().find(|d| d.id == id)
    }

    /// Look up an input data element by id.
    pub fn input_data(&self, id: &str) -> Option<&InputData> {
        self.input_data.iter().find(|i| i.id == id)
    }
}

/// A DMN decision element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Decision {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<Variable>,
    pub information_requirements: Vec<InformationRequirement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_table: Option<DecisionTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal_expression: Option<LiteralExpression>,
}

/// Output variable binding of a decision or input data element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Variable {
    pub id: String,
    pub name: String,
    pub type_ref: String,
}

/// A dependency on another decision or on an input data element.
///
/// Exactly one of `required_decision` / `required_input` is set in a
/// well-formed model; the validator flags anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InformationRequirement {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_decision: Option<ElementReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_input: Option<ElementReference>,
}

/// A local `#id` reference to another element in the same model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementReference {
    pub href: String,
}

impl ElementReference {
    /// The referenced element id, with the leading `#` stripped.
    pub fn target_id(&self) -> &str {
        self.href.strip_prefix('#').unwrap_or(&self.href)
    }
}

/// Input data consumed by decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputData {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<Variable>,
}

/// A business knowledge model element. Parsed and carried for round-trip
/// fidelity; not evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessKnowledgeModel {
    pub id: String,
    pub name: String,
}

/// A DMN decision table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecisionTable {
    pub id: String,
    /// UNIQUE, FIRST, PRIORITY, ANY, COLLECT, RULE ORDER, OUTPUT ORDER.
    /// The parser fills in UNIQUE when the attribute is absent.
    pub hit_policy: String,
    /// SUM, COUNT, MIN, MAX; meaningful only with COLLECT.
    pub aggregation: String,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub rules: Vec<Rule>,
}

/// An input column of a decision table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Input {
    pub id: String,
    pub label: String,
    pub input_expression: InputExpression,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_values: Option<InputValues>,
}

/// The expression producing the tested value for an input column. For this
/// engine that is the name of a variable in the evaluation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputExpression {
    pub id: String,
    pub type_ref: String,
    pub text: String,
}

/// Allowed values for an input column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputValues {
    pub text: String,
}

/// An output column of a decision table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Output {
    pub id: String,
    pub label: String,
    pub name: String,
    pub type_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_values: Option<OutputValues>,
}

impl Output {
    /// The key under which this column's value appears in evaluation
    /// results: the column name, falling back to the column id.
    pub fn output_key(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Declared output-value ordering for a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputValues {
    pub text: String,
}

/// A single rule row: one unary test per input column, one output
/// expression per output column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rule {
    pub id: String,
    pub description: String,
    pub input_entries: Vec<InputEntry>,
    pub output_entries: Vec<OutputEntry>,
}

/// A condition cell: a FEEL unary test such as `>= 18`, `[10..20)`, `-`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputEntry {
    pub id: String,
    pub text: String,
}

/// An output cell: a FEEL literal expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputEntry {
    pub id: String,
    pub text: String,
}

/// A decision defined by a single FEEL expression. Accepted by the parser
/// and validator; evaluation reports it as unsupported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiteralExpression {
    pub id: String,
    pub type_ref: String,
    pub text: String,
}

/// The seven DMN hit policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPolicy {
    Unique,
    First,
    Priority,
    Any,
    Collect,
    RuleOrder,
    OutputOrder,
}

impl HitPolicy {
    /// Parse the XML attribute form. Returns `None` for anything outside
    /// the DMN vocabulary; the empty string is not accepted here (the
    /// parser defaults it to UNIQUE before this is consulted).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNIQUE" => Some(HitPolicy::Unique),
            "FIRST" => Some(HitPolicy::First),
            "PRIORITY" => Some(HitPolicy::Priority),
            "ANY" => Some(HitPolicy::Any),
            "COLLECT" => Some(HitPolicy::Collect),
            "RULE ORDER" => Some(HitPolicy::RuleOrder),
            "OUTPUT ORDER" => Some(HitPolicy::OutputOrder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HitPolicy::Unique => "UNIQUE",
            HitPolicy::First => "FIRST",
            HitPolicy::Priority => "PRIORITY",
            HitPolicy::Any => "ANY",
            HitPolicy::Collect => "COLLECT",
            HitPolicy::RuleOrder => "RULE ORDER",
            HitPolicy::OutputOrder => "OUTPUT ORDER",
        }
    }
}

/// COLLECT aggregation operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Count,
    Min,
    Max,
}

impl Aggregation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUM" => Some(Aggregation::Sum),
            "COUNT" => Some(Aggregation::Count),
            "MIN" => Some(Aggregation::Min),
            "MAX" => Some(Aggregation::Max),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Count => "COUNT",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
        }
    }
}
