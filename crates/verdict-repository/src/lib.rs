//! Verdict Repository - versioned storage for deployed DMN definitions
//!
//! A deployed definition is immutable: every deploy of the same
//! `(tenant, key)` pair creates a new monotonically increasing version.
//! Two backends share the [`DefinitionRepository`] contract:
//!
//! - [`MemoryRepository`]: a readers-writer-locked map, used in tests and
//!   when the server runs without a database
//! - [`PostgresRepository`]: sqlx-backed persistence with version
//!   assignment serialized per `(tenant, key)`

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod traits;

pub use error::{RepositoryError, RepositoryResult};
pub use memory::MemoryRepository;
pub use models::{compute_checksum, Definition, ListFilter, NewDefinition};
pub use postgres::{run_migrations, PostgresRepository};
pub use traits::DefinitionRepository;
