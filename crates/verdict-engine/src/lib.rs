//! Verdict Engine - DMN decision-table evaluation
//!
//! Given a deployed definition and a set of input variables, the engine
//! selects the target decision, matches its rules with the FEEL unary-test
//! interpreter, and reduces the matched set through the table's hit policy:
//!
//! - [`unary::evaluate_unary_test`]: one rule cell against one typed value
//! - [`output::parse_output_value`]: output-cell literal -> [`verdict_core::Value`]
//! - [`hit_policy`]: the seven DMN hit policies with COLLECT aggregations
//! - [`Engine`]: the evaluation orchestrator over a definition repository
//!
//! Evaluation is pure CPU over immutable data; the only await point is the
//! definition load, so arbitrarily many evaluations can run concurrently
//! against the same stored definition.

pub mod engine;
pub mod error;
pub mod hit_policy;
pub mod output;
pub mod unary;

pub use engine::{Engine, EvaluateRequest, EvaluateResult};
pub use error::{EngineError, EvalError};
pub use hit_policy::{MatchedRule, OutputRow};
pub use output::parse_output_value;
pub use unary::evaluate_unary_test;
