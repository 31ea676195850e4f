//! Verdict Parser - DMN XML parsing and validation
//!
//! Turns DMN 1.3 XML into the typed model from `verdict-core` and checks
//! the structural invariants a deployable model must satisfy:
//!
//! - [`DmnParser`]: XML bytes -> [`verdict_core::Definitions`]
//! - [`Validator`]: accumulating structural and graph-level checks
//!
//! The parser is permissive (unknown elements are skipped, missing optional
//! attributes become defaults); all semantic checking lives in the
//! validator so a caller sees every problem in one pass.

pub mod error;
pub mod parser;
pub mod validator;

pub use error::{ParseError, Result};
pub use parser::DmnParser;
pub use validator::{ValidationError, Validator};
