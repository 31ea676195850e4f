//! Error types for the repository layer

use thiserror::Error;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No definition exists for the requested key (and version, if given)
    #[error("definition not found: key={key}, tenantId={tenant_id}")]
    NotFound { key: String, tenant_id: String },

    /// Version assignment kept colliding under concurrent deploys
    #[error("deploy conflict: could not assign a version for key={key}, tenantId={tenant_id}")]
    DeployConflict { key: String, tenant_id: String },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Parsed-model (de)serialization error
    #[error("failed to serialize parsed model: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn not_found(key: &str, tenant_id: &str) -> Self {
        RepositoryError::NotFound {
            key: key.to_string(),
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Whether this error means the definition simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}
