//! Verdict HTTP server
//!
//! REST boundary over the Verdict decision engine: deploy DMN definitions,
//! inspect stored versions, and evaluate decisions.

pub mod api;
pub mod config;
pub mod error;
