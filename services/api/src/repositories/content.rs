//! PostgreSQL content repository

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::ContentStore;
use crate::models::content::{
    ContentRecord, ImageAsset, ImageRef, RecordPatch, RecordSummary, ResourceKind,
};

const RECORD_COLUMNS: &str = "id, name, description, designation, image_data, \
     image_content_type, image_path, created_at, updated_at";

/// Listing columns; image bytes are reduced to a presence flag
const SUMMARY_COLUMNS: &str = "id, name, description, designation, \
     image_data IS NOT NULL AS has_image, image_path";

/// Content repository backed by the `content_records` table
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    /// Create a new content repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table if it does not exist yet
    pub async fn init_schema(&self) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS content_records (
                id UUID PRIMARY KEY,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                designation TEXT,
                image_data BYTEA,
                image_content_type TEXT,
                image_path TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS content_records_kind_idx \
             ON content_records (kind, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("content_records schema ready");
        Ok(())
    }
}

fn record_from_row(kind: ResourceKind, row: &PgRow) -> DatabaseResult<ContentRecord> {
    let image = ImageAsset::from_columns(
        row.try_get("image_data")?,
        row.try_get("image_content_type")?,
        row.try_get("image_path")?,
    );

    Ok(ContentRecord {
        id: row.try_get("id")?,
        kind,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        designation: row.try_get("designation")?,
        image,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn summary_from_row(kind: ResourceKind, row: &PgRow) -> DatabaseResult<RecordSummary> {
    Ok(RecordSummary {
        id: row.try_get("id")?,
        kind,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        designation: row.try_get("designation")?,
        image: ImageRef::from_columns(row.try_get("has_image")?, row.try_get("image_path")?),
    })
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn find_all(&self, kind: ResourceKind) -> DatabaseResult<Vec<RecordSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM content_records WHERE kind = $1 ORDER BY created_at, id",
            SUMMARY_COLUMNS
        ))
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| summary_from_row(kind, row)).collect()
    }

    async fn find_by_id(&self, kind: ResourceKind, id: Uuid) -> DatabaseResult<Option<ContentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM content_records WHERE kind = $1 AND id = $2",
            RECORD_COLUMNS
        ))
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| record_from_row(kind, &row)).transpose()
    }

    async fn insert(&self, record: &ContentRecord) -> DatabaseResult<()> {
        let (image_data, image_content_type, image_path) = match &record.image {
            ImageAsset::Stored {
                bytes,
                content_type,
            } => (Some(bytes.as_slice()), Some(content_type.as_str()), None),
            ImageAsset::LegacyPath { path } => (None, None, Some(path.as_str())),
            ImageAsset::Absent => (None, None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO content_records
                (id, kind, name, description, designation, image_data,
                 image_content_type, image_path, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(record.kind.as_str())
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.designation)
        .bind(image_data)
        .bind(image_content_type)
        .bind(image_path)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: Uuid,
        patch: &RecordPatch,
    ) -> DatabaseResult<Option<ContentRecord>> {
        // A new image replaces every image column, including a legacy path.
        let replace_image = patch.image.is_some();
        let image_data = patch.image.as_ref().map(|i| i.bytes.as_slice());
        let image_content_type = patch.image.as_ref().map(|i| i.content_type.as_str());

        let row = sqlx::query(&format!(
            r#"
            UPDATE content_records SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                designation = COALESCE($5, designation),
                image_data = CASE WHEN $6 THEN $7 ELSE image_data END,
                image_content_type = CASE WHEN $6 THEN $8 ELSE image_content_type END,
                image_path = CASE WHEN $6 THEN NULL ELSE image_path END,
                updated_at = NOW()
            WHERE kind = $1 AND id = $2
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(kind.as_str())
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.designation)
        .bind(replace_image)
        .bind(image_data)
        .bind(image_content_type)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| record_from_row(kind, &row)).transpose()
    }

    async fn delete(&self, kind: ResourceKind, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM content_records WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
