//! Stored definition records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use verdict_core::Definitions;

/// A stored, immutable version of a deployed DMN definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    /// Server-assigned identifier
    pub id: Uuid,
    /// Business identifier: the first decision's id, or the definitions id
    pub key: String,
    /// Monotonically increasing per `(tenant, key)`
    pub version: i32,
    pub name: String,
    /// Original XML, preserved verbatim
    pub source: String,
    /// Model derived from `source` at deploy time
    pub parsed_model: Definitions,
    /// SHA-256 hex of `source`, recomputed on every deploy
    pub checksum: String,
    /// Empty string means the shared tenant
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tenant_id: String,
    pub created_at: DateTime<Utc>,
}

/// Input to a deploy: everything the caller provides. The repository
/// assigns id, version, checksum, and the creation timestamp.
#[derive(Debug, Clone)]
pub struct NewDefinition {
    pub key: String,
    pub name: String,
    pub source: String,
    pub parsed_model: Definitions,
    pub tenant_id: String,
}

/// Filter for listing definitions.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Restrict to a single key
    pub key: Option<String>,
    /// Restrict to a tenant; `Some("")` means the shared tenant, `None`
    /// applies no tenant filter
    pub tenant_id: Option<String>,
    /// Maximum rows after collapsing to latest versions; 0 means no limit
    pub limit: i64,
    pub offset: i64,
}

/// SHA-256 of the raw XML, lowercase hex.
pub fn compute_checksum(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}
