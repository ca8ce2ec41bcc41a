//! PostgreSQL drive store: one JSONB document per drive plus a version column.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use super::{DriveStore, SaveOutcome};
use crate::common::{DriveId, DriveResult};
use crate::domains::drives::models::Drive;

#[derive(FromRow)]
struct DriveRow {
    document: Json<Drive>,
    version: i64,
}

impl DriveRow {
    /// The column is authoritative for the version, not the document copy.
    fn into_drive(self) -> Drive {
        let mut drive = self.document.0;
        drive.version = self.version;
        drive
    }
}

#[derive(Clone)]
pub struct PostgresDriveStore {
    pool: PgPool,
}

impl PostgresDriveStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn current_version(&self, drive_id: DriveId) -> DriveResult<Option<i64>> {
        let version = sqlx::query_scalar::<_, i64>("SELECT version FROM drives WHERE id = $1")
            .bind(drive_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(version)
    }
}

#[async_trait]
impl DriveStore for PostgresDriveStore {
    async fn insert(&self, drive: &Drive) -> DriveResult<i64> {
        let version = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO drives (id, name, document, version, created_at, updated_at)
            VALUES ($1, $2, $3, 1, $4, $5)
            RETURNING version
            "#,
        )
        .bind(drive.id)
        .bind(&drive.name)
        .bind(Json(drive))
        .bind(drive.created_at)
        .bind(drive.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(version)
    }

    async fn find(&self, drive_id: DriveId) -> DriveResult<Option<Drive>> {
        let row = sqlx::query_as::<_, DriveRow>(
            "SELECT document, version FROM drives WHERE id = $1",
        )
        .bind(drive_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DriveRow::into_drive))
    }

    async fn list(&self) -> DriveResult<Vec<Drive>> {
        let rows = sqlx::query_as::<_, DriveRow>(
            "SELECT document, version FROM drives ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DriveRow::into_drive).collect())
    }

    async fn save(&self, drive: &Drive, expected_version: i64) -> DriveResult<SaveOutcome> {
        let saved = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE drives
            SET document = $1,
                name = $2,
                version = version + 1,
                updated_at = $3
            WHERE id = $4 AND version = $5
            RETURNING version
            "#,
        )
        .bind(Json(drive))
        .bind(&drive.name)
        .bind(drive.updated_at)
        .bind(drive.id)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(version) = saved {
            return Ok(SaveOutcome::Saved { version });
        }

        Ok(match self.current_version(drive.id).await? {
            Some(actual) => SaveOutcome::Conflict { actual },
            None => SaveOutcome::NotFound,
        })
    }
}
