//! PostgreSQL repository implementation
//!
//! Stores each deployed version as one row in `dmn_definitions`, the
//! parsed model as JSONB alongside the verbatim XML source. Version
//! assignment happens inside the INSERT statement; a concurrent deploy of
//! the same `(tenant, key)` can still collide on the uniqueness index, in
//! which case the deploy retries with a freshly computed version.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{compute_checksum, Definition, ListFilter, NewDefinition};
use crate::traits::DefinitionRepository;
use crate::RepositoryResult;

const DEPLOY_RETRIES: usize = 3;

const MIGRATIONS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS dmn_definitions (
        id           UUID PRIMARY KEY,
        key          VARCHAR(255) NOT NULL,
        version      INT NOT NULL DEFAULT 1,
        name         VARCHAR(255),
        source       TEXT NOT NULL,
        parsed_model JSONB,
        checksum     VARCHAR(64),
        tenant_id    VARCHAR(64),
        created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    // Expression index so the shared tenant (NULL) is constrained too;
    // NULLs are pairwise distinct under a plain unique constraint.
    r#"CREATE UNIQUE INDEX IF NOT EXISTS uq_dmn_def_key_version_tenant
        ON dmn_definitions(key, version, COALESCE(tenant_id, ''))"#,
    r#"CREATE INDEX IF NOT EXISTS idx_dmn_def_key ON dmn_definitions(key)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_dmn_def_tenant ON dmn_definitions(tenant_id) WHERE tenant_id IS NOT NULL"#,
    r#"CREATE INDEX IF NOT EXISTS idx_dmn_def_key_version ON dmn_definitions(key, version DESC)"#,
];

/// Create the definitions table and its indexes if they do not exist.
pub async fn run_migrations(pool: &PgPool) -> RepositoryResult<()> {
    for statement in MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// PostgreSQL implementation of [`DefinitionRepository`].
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and verify the connection.
    pub async fn connect(database_url: &str, max_connections: u32) -> RepositoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// The underlying pool, for migrations and health checks.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// The shared tenant is stored as NULL.
fn nullable_tenant(tenant_id: &str) -> Option<&str> {
    if tenant_id.is_empty() {
        None
    } else {
        Some(tenant_id)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn definition_from_row(row: &PgRow) -> RepositoryResult<Definition> {
    let parsed_json: serde_json::Value = row.try_get("parsed_model")?;
    let tenant_id: Option<String> = row.try_get("tenant_id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Definition {
        id: row.try_get("id")?,
        key: row.try_get("key")?,
        version: row.try_get("version")?,
        name: row.try_get("name")?,
        source: row.try_get("source")?,
        parsed_model: serde_json::from_value(parsed_json)?,
        checksum: row.try_get("checksum")?,
        tenant_id: tenant_id.unwrap_or_default(),
        created_at,
    })
}

#[async_trait]
impl DefinitionRepository for PostgresRepository {
    async fn deploy(&self, new: NewDefinition) -> RepositoryResult<Definition> {
        let parsed_json = serde_json::to_value(&new.parsed_model)?;
        let checksum = compute_checksum(&new.source);
        let tenant = nullable_tenant(&new.tenant_id);

        for attempt in 0..DEPLOY_RETRIES {
            let id = Uuid::new_v4();
            let created_at = Utc::now();

            let inserted = sqlx::query(
                r#"
                INSERT INTO dmn_definitions
                    (id, key, version, name, source, parsed_model, checksum, tenant_id, created_at)
                SELECT $1, $2, COALESCE(MAX(version), 0) + 1, $3, $4, $5, $6, $7, $8
                FROM dmn_definitions
                WHERE key = $2 AND tenant_id IS NOT DISTINCT FROM $7
                RETURNING version
                "#,
            )
            .bind(id)
            .bind(&new.key)
            .bind(&new.name)
            .bind(&new.source)
            .bind(&parsed_json)
            .bind(&checksum)
            .bind(tenant)
            .bind(created_at)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(row) => {
                    let version: i32 = row.try_get("version")?;
                    return Ok(Definition {
                        id,
                        key: new.key,
                        version,
                        name: new.name,
                        source: new.source,
                        parsed_model: new.parsed_model,
                        checksum,
                        tenant_id: new.tenant_id,
                        created_at,
                    });
                }
                Err(err) if is_unique_violation(&err) => {
                    debug!(
                        key = %new.key,
                        attempt,
                        "version collision on deploy, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(RepositoryError::DeployConflict {
            key: new.key,
            tenant_id: new.tenant_id,
        })
    }

    async fn get_by_key(&self, key: &str, tenant_id: &str) -> RepositoryResult<Definition> {
        let row = sqlx::query(
            r#"
            SELECT id, key, version, name, source, parsed_model, checksum, tenant_id, created_at
            FROM dmn_definitions
            WHERE key = $1 AND tenant_id IS NOT DISTINCT FROM $2
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .bind(key)
        .bind(nullable_tenant(tenant_id))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found(key, tenant_id))?;

        definition_from_row(&row)
    }

    async fn get_by_key_and_version(
        &self,
        key: &str,
        version: i32,
        tenant_id: &str,
    ) -> RepositoryResult<Definition> {
        let row = sqlx::query(
            r#"
            SELECT id, key, version, name, source, parsed_model, checksum, tenant_id, created_at
            FROM dmn_definitions
            WHERE key = $1 AND version = $2 AND tenant_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(key)
        .bind(version)
        .bind(nullable_tenant(tenant_id))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found(key, tenant_id))?;

        definition_from_row(&row)
    }

    async fn list(&self, filter: &ListFilter) -> RepositoryResult<Vec<Definition>> {
        let rows = sqlx::query(
            r#"
            SELECT id, key, version, name, source, parsed_model, checksum, tenant_id, created_at
            FROM (
                SELECT DISTINCT ON (key, tenant_id)
                    id, key, version, name, source, parsed_model, checksum, tenant_id, created_at
                FROM dmn_definitions
                WHERE ($1::text IS NULL OR key = $1)
                  AND ($2::text IS NULL OR tenant_id IS NOT DISTINCT FROM NULLIF($2, ''))
                ORDER BY key, tenant_id, version DESC
            ) latest
            ORDER BY name ASC
            LIMIT NULLIF($3::bigint, 0) OFFSET $4
            "#,
        )
        .bind(filter.key.as_deref())
        .bind(filter.tenant_id.as_deref())
        .bind(filter.limit.max(0))
        .bind(filter.offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(definition_from_row).collect()
    }

    async fn get_all_versions(
        &self,
        key: &str,
        tenant_id: &str,
    ) -> RepositoryResult<Vec<Definition>> {
        let rows = sqlx::query(
            r#"
            SELECT id, key, version, name, source, parsed_model, checksum, tenant_id, created_at
            FROM dmn_definitions
            WHERE key = $1 AND tenant_id IS NOT DISTINCT FROM $2
            ORDER BY version DESC
            "#,
        )
        .bind(key)
        .bind(nullable_tenant(tenant_id))
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(RepositoryError::not_found(key, tenant_id));
        }

        rows.iter().map(definition_from_row).collect()
    }

    async fn delete(&self, key: &str, tenant_id: &str) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM dmn_definitions
            WHERE key = $1 AND tenant_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(key)
        .bind(nullable_tenant(tenant_id))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(key, tenant_id));
        }

        Ok(())
    }
}
