use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{stamp, BiodataRepository, PersistenceError};
use crate::record::Record;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS biodata (
    id UUID PRIMARY KEY,
    user_id TEXT NOT NULL,
    data JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_OWNER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS biodata_user_updated_idx ON biodata (user_id, updated_at DESC)
"#;

/// Postgres-backed repository; the whole record lives in a JSONB column.
#[derive(Clone)]
pub struct PgBiodataRepository {
    pool: PgPool,
}

impl PgBiodataRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table and index if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), PersistenceError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_OWNER_INDEX).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BiodataRepository for PgBiodataRepository {
    async fn save(&self, owner: &str, record: Record) -> Result<String, PersistenceError> {
        match record.id.clone() {
            None => {
                let id = Uuid::new_v4();
                let record = stamp(record, &id.to_string(), owner, true);
                sqlx::query(
                    r#"
                    INSERT INTO biodata (id, user_id, data, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(id)
                .bind(owner)
                .bind(Json(&record))
                .bind(record.created_at)
                .bind(record.updated_at)
                .execute(&self.pool)
                .await?;
                Ok(id.to_string())
            }
            Some(raw_id) => {
                let id = Uuid::parse_str(&raw_id)
                    .map_err(|_| PersistenceError::NotFound(raw_id.clone()))?;
                let record = stamp(record, &raw_id, owner, false);
                let result = sqlx::query(
                    r#"
                    UPDATE biodata SET data = $2, updated_at = $3
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(Json(&record))
                .bind(record.updated_at)
                .execute(&self.pool)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(PersistenceError::NotFound(raw_id));
                }
                Ok(raw_id)
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Record>, PersistenceError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let row = sqlx::query("SELECT data FROM biodata WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let Json(record) = row.try_get::<Json<Record>, _>("data")?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Record>, PersistenceError> {
        let rows = sqlx::query(
            "SELECT data FROM biodata WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<Json<Record>, _>("data")
                    .map(|Json(record)| record)
                    .map_err(PersistenceError::from)
            })
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        let uuid =
            Uuid::parse_str(id).map_err(|_| PersistenceError::NotFound(id.to_string()))?;
        let result = sqlx::query("DELETE FROM biodata WHERE id = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
