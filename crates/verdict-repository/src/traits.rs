//! The repository contract shared by all storage backends
//!
//! Definitions are immutable once deployed; mutation happens only through
//! new versions. The empty tenant id and an absent tenant are the same
//! "shared" tenant at this level (the relational backend stores NULL for
//! that case).

use async_trait::async_trait;

use crate::models::{Definition, ListFilter, NewDefinition};
use crate::RepositoryResult;

/// Versioned storage for deployed definitions.
///
/// # Concurrency
///
/// Implementations must be `Send + Sync`; many concurrent reads run
/// against the same stored definitions. Two concurrent deploys of the same
/// `(tenant, key)` must never be assigned the same version — backends
/// either serialize version assignment or retry on conflict.
#[async_trait]
pub trait DefinitionRepository: Send + Sync {
    /// Deploy a new version of a definition.
    ///
    /// Assigns the id, computes `version = max(existing) + 1` for the
    /// `(tenant, key)` pair (1 when none exist), stamps the creation time,
    /// and computes the checksum from `source`.
    async fn deploy(&self, new: NewDefinition) -> RepositoryResult<Definition>;

    /// Latest version for a key, or `NotFound`.
    async fn get_by_key(&self, key: &str, tenant_id: &str) -> RepositoryResult<Definition>;

    /// Exact version for a key, or `NotFound`.
    async fn get_by_key_and_version(
        &self,
        key: &str,
        version: i32,
        tenant_id: &str,
    ) -> RepositoryResult<Definition>;

    /// One row per `(tenant, key)` — the latest version of each — ordered
    /// by name ascending, paginated after the collapse.
    async fn list(&self, filter: &ListFilter) -> RepositoryResult<Vec<Definition>>;

    /// Every version for a key, newest first, or `NotFound`.
    async fn get_all_versions(
        &self,
        key: &str,
        tenant_id: &str,
    ) -> RepositoryResult<Vec<Definition>>;

    /// Remove every version for a key; `NotFound` when none existed.
    async fn delete(&self, key: &str, tenant_id: &str) -> RepositoryResult<()>;
}
