//! Entity store implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use symbiont_core::entities::EntityKind;
use symbiont_core::error::{StorageError, StorageResult};
use symbiont_core::ports::EntityStore;

use super::database::Database;

/// PostgreSQL implementation of [`EntityStore`].
///
/// Each entity is one row in the `entities` table; `save` is an upsert on
/// the `(kind, id)` primary key, which is what makes handler replays
/// idempotent at the storage level.
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Number of stored entities of one kind. Used by diagnostics.
    pub async fn count(&self, kind: EntityKind) -> StorageResult<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entities WHERE kind = $1")
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;
        Ok(row.0 as u64)
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn load(&self, kind: EntityKind, id: &str) -> StorageResult<Option<serde_json::Value>> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            r#"
            SELECT data
            FROM entities
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(row.map(|(data,)| data))
    }

    async fn save(&self, kind: EntityKind, id: &str, data: serde_json::Value) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO entities (kind, id, data, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (kind, id) DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(())
    }
}
