//! In-memory repository implementation
//!
//! Backs tests and database-less deployments. A single readers-writer lock
//! protects the map: deploys and deletes take the write half, lookups and
//! listings the read half, so version assignment is serialized per process.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{compute_checksum, Definition, ListFilter, NewDefinition};
use crate::traits::DefinitionRepository;
use crate::RepositoryResult;

/// In-memory implementation of [`DefinitionRepository`].
#[derive(Debug, Default)]
pub struct MemoryRepository {
    /// Keyed `"{tenant}:{key}:{version}"`
    definitions: RwLock<HashMap<String, Definition>>,
}

impl MemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

fn storage_key(tenant_id: &str, key: &str, version: i32) -> String {
    format!("{tenant_id}:{key}:{version}")
}

#[async_trait]
impl DefinitionRepository for MemoryRepository {
    async fn deploy(&self, new: NewDefinition) -> RepositoryResult<Definition> {
        let mut definitions = self.definitions.write().await;

        let next_version = definitions
            .values()
            .filter(|d| d.key == new.key && d.tenant_id == new.tenant_id)
            .map(|d| d.version)
            .max()
            .map_or(1, |v| v + 1);

        let def = Definition {
            id: Uuid::new_v4(),
            key: new.key,
            version: next_version,
            name: new.name,
            checksum: compute_checksum(&new.source),
            source: new.source,
            parsed_model: new.parsed_model,
            tenant_id: new.tenant_id,
            created_at: Utc::now(),
        };

        definitions.insert(
            storage_key(&def.tenant_id, &def.key, def.version),
            def.clone(),
        );

        Ok(def)
    }

    async fn get_by_key(&self, key: &str, tenant_id: &str) -> RepositoryResult<Definition> {
        let definitions = self.definitions.read().await;

        definitions
            .values()
            .filter(|d| d.key == key && d.tenant_id == tenant_id)
            .max_by_key(|d| d.version)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(key, tenant_id))
    }

    async fn get_by_key_and_version(
        &self,
        key: &str,
        version: i32,
        tenant_id: &str,
    ) -> RepositoryResult<Definition> {
        let definitions = self.definitions.read().await;

        definitions
            .get(&storage_key(tenant_id, key, version))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(key, tenant_id))
    }

    async fn list(&self, filter: &ListFilter) -> RepositoryResult<Vec<Definition>> {
        let definitions = self.definitions.read().await;

        // Latest version per (tenant, key)
        let mut latest: HashMap<(String, String), &Definition> = HashMap::new();
        for def in definitions.values() {
            if let Some(key) = &filter.key {
                if &def.key != key {
                    continue;
                }
            }
            if let Some(tenant) = &filter.tenant_id {
                if &def.tenant_id != tenant {
                    continue;
                }
            }

            let entry_key = (def.tenant_id.clone(), def.key.clone());
            let newer = latest
                .get(&entry_key)
                .map_or(true, |existing| def.version > existing.version);
            if newer {
                latest.insert(entry_key, def);
            }
        }

        let mut result: Vec<Definition> = latest.into_values().cloned().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));

        let offset = filter.offset.max(0) as usize;
        if offset >= result.len() {
            return Ok(Vec::new());
        }
        result.drain(..offset);

        if filter.limit > 0 && (filter.limit as usize) < result.len() {
            result.truncate(filter.limit as usize);
        }

        Ok(result)
    }

    async fn get_all_versions(
        &self,
        key: &str,
        tenant_id: &str,
    ) -> RepositoryResult<Vec<Definition>> {
        let definitions = self.definitions.read().await;

        let mut versions: Vec<Definition> = definitions
            .values()
            .filter(|d| d.key == key && d.tenant_id == tenant_id)
            .cloned()
            .collect();

        if versions.is_empty() {
            return Err(RepositoryError::not_found(key, tenant_id));
        }

        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    async fn delete(&self, key: &str, tenant_id: &str) -> RepositoryResult<()> {
        let mut definitions = self.definitions.write().await;

        let doomed: Vec<String> = definitions
            .iter()
            .filter(|(_, d)| d.key == key && d.tenant_id == tenant_id)
            .map(|(k, _)| k.clone())
            .collect();

        if doomed.is_empty() {
            return Err(RepositoryError::not_found(key, tenant_id));
        }

        for k in doomed {
            definitions.remove(&k);
        }

        Ok(())
    }
}
