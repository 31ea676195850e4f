//! Engine error types

use thiserror::Error;
use verdict_repository::RepositoryError;

/// Failure while interpreting a single rule cell.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A range test was applied to a non-numeric value
    #[error("range comparison requires numeric value")]
    RangeRequiresNumeric,

    /// A range expression did not have the `<low>..<high>` shape
    #[error("invalid range format: {0}")]
    InvalidRange(String),

    /// A bound or comparison threshold did not parse as a number
    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

/// Failure of a decision evaluation.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The definition (or the requested version) does not exist
    #[error("{0}")]
    NotFound(String),

    /// The definition parsed but contains no decisions
    #[error("no decision found in definition")]
    NoDecisions,

    /// The selected decision has no decision table
    #[error("decision must have a decision table (literal expressions not yet supported)")]
    LiteralExpressionUnsupported,

    /// The table's hit policy is outside the DMN vocabulary
    #[error("unsupported hit policy: {0}")]
    UnsupportedHitPolicy(String),

    /// UNIQUE matched more than one rule
    #[error("UNIQUE hit policy violated: {matched} rules matched (expected 1)")]
    HitPolicyViolation { matched: usize },

    /// SUM/MIN/MAX saw no numeric output values
    #[error("{aggregation} aggregation requires numeric outputs")]
    AggregationRequiresNumeric { aggregation: &'static str },

    /// COLLECT with an aggregation outside the DMN vocabulary
    #[error("unsupported aggregation: {0}")]
    UnsupportedAggregation(String),

    /// A rule cell failed to evaluate
    #[error("error evaluating rule {rule_id}: input entry {index}: {source}")]
    Rule {
        rule_id: String,
        index: usize,
        #[source]
        source: EvalError,
    },

    /// A rule carries more cells than the table has columns
    #[error("rule {rule_id}: entry index {index} out of bounds")]
    EntryOutOfBounds { rule_id: String, index: usize },

    /// Storage failure while loading the definition
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
