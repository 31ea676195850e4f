//! REST API type definitions
//!
//! Request and response types for the REST API endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use verdict_engine::Engine;
use verdict_repository::{Definition, DefinitionRepository};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn DefinitionRepository>,
    pub engine: Arc<Engine>,
}

/// JSON deploy request body (`{"name": ..., "xml": ...}`)
#[derive(Debug, Deserialize)]
pub struct DeployRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub xml: String,
}

/// Definition summary without the source or parsed model
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionResponse {
    pub id: String,
    pub key: String,
    pub version: i32,
    pub name: String,
    pub checksum: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tenant_id: String,
    pub created_at: String,
}

impl From<&Definition> for DefinitionResponse {
    fn from(def: &Definition) -> Self {
        Self {
            id: def.id.to_string(),
            key: def.key.clone(),
            version: def.version,
            name: def.name.clone(),
            checksum: def.checksum.clone(),
            tenant_id: def.tenant_id.clone(),
            created_at: def.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// One entry of the versions listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: i32,
    pub created_at: String,
    pub checksum: String,
}

/// Response of `GET /api/v1/definitions/:key/versions`
#[derive(Debug, Serialize)]
pub struct VersionsResponse {
    pub key: String,
    pub versions: Vec<VersionInfo>,
}

/// Evaluate request body. Variables arrive as raw JSON and are converted
/// to typed values at the boundary so schema mismatches become 400s.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatePayload {
    #[serde(default)]
    pub decision_key: String,

    #[serde(default)]
    pub version: Option<i32>,

    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Query parameters for the definitions listing
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub key: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameter selecting a definition version
#[derive(Debug, Default, Deserialize)]
pub struct VersionQuery {
    pub version: Option<i32>,
}
