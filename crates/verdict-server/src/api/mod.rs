//! REST API
//!
//! Route handlers, request/response payloads, and router assembly.

pub mod conversions;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod types;

pub use router::create_router;
pub use types::AppState;
