use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::Scope;
use crate::features::files::models::{File, FileFilter, FileListing, NewFile};
use crate::modules::storage::BlobStore;

/// Persistence for file records
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Fails with `Conflict` if another file already uses the blob handle
    async fn insert(&self, new_file: NewFile) -> Result<File>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<File>>;

    /// Files of `scope` matching `filter`, newest first, each flagged with
    /// whether `viewer_id` has favorited it
    async fn list_by_scope(
        &self,
        scope: &Scope,
        filter: &FileFilter,
        viewer_id: Uuid,
    ) -> Result<Vec<FileListing>>;

    /// Set the deletion flag. Marking keeps the first mark time; clearing resets it.
    ///
    /// Returns `None` if the file no longer exists.
    async fn set_should_delete(&self, id: Uuid, should_delete: bool) -> Result<Option<File>>;

    /// Flagged files marked at or before `cutoff`, oldest mark first,
    /// leaving out `exclude`
    async fn list_pending_deletion(
        &self,
        cutoff: DateTime<Utc>,
        exclude: &[Uuid],
        limit: i64,
    ) -> Result<Vec<File>>;

    /// Delete the file and its favorites, but only while it is still flagged.
    /// The blob is released before the deletion commits; if the release
    /// fails nothing is deleted and the file stays flagged. Returns the
    /// deleted row.
    async fn purge_if_flagged(&self, id: Uuid, blobs: &dyn BlobStore) -> Result<Option<File>>;
}

fn map_insert_error(e: sqlx::Error, blob_handle: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        // 23505: unique_violation
        if db_err.code().as_deref() == Some("23505")
            && db_err.constraint() == Some("uq_files_blob_handle")
        {
            return AppError::Conflict(format!(
                "Blob handle '{}' is already registered to another file",
                blob_handle
            ));
        }
    }
    AppError::Database(e)
}

pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn insert(&self, new_file: NewFile) -> Result<File> {
        let file = sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (id, name, scope_kind, scope_id, blob_handle, file_type, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&new_file.name)
        .bind(new_file.scope.kind())
        .bind(new_file.scope.id())
        .bind(&new_file.blob_handle)
        .bind(new_file.file_type)
        .bind(new_file.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &new_file.blob_handle))?;

        Ok(file)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<File>> {
        let file = sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(file)
    }

    async fn list_by_scope(
        &self,
        scope: &Scope,
        filter: &FileFilter,
        viewer_id: Uuid,
    ) -> Result<Vec<FileListing>> {
        let files = sqlx::query_as::<_, FileListing>(
            r#"
            SELECT f.*,
                   EXISTS (
                       SELECT 1 FROM favorites fav
                       WHERE fav.file_id = f.id AND fav.user_id = $3
                   ) AS is_favorited
            FROM files f
            WHERE f.scope_kind = $1
              AND f.scope_id = $2
              AND f.should_delete = $4
              AND ($5::text IS NULL OR strpos(f.name, $5::text) > 0)
              AND ($6::file_type IS NULL OR f.file_type = $6::file_type)
              AND (
                  NOT $7
                  OR EXISTS (
                      SELECT 1 FROM favorites fav
                      WHERE fav.file_id = f.id AND fav.user_id = $3
                  )
              )
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(scope.kind())
        .bind(scope.id())
        .bind(viewer_id)
        .bind(filter.deleted_only)
        .bind(filter.query.as_deref())
        .bind(filter.file_type)
        .bind(filter.favorites_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    async fn set_should_delete(&self, id: Uuid, should_delete: bool) -> Result<Option<File>> {
        let file = sqlx::query_as::<_, File>(
            r#"
            UPDATE files
            SET should_delete = $2,
                marked_for_deletion_at = CASE
                    WHEN $2 THEN COALESCE(marked_for_deletion_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(should_delete)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    async fn list_pending_deletion(
        &self,
        cutoff: DateTime<Utc>,
        exclude: &[Uuid],
        limit: i64,
    ) -> Result<Vec<File>> {
        let files = sqlx::query_as::<_, File>(
            r#"
            SELECT * FROM files
            WHERE should_delete = TRUE
              AND (marked_for_deletion_at IS NULL OR marked_for_deletion_at <= $1)
              AND NOT (id = ANY($2))
            ORDER BY marked_for_deletion_at ASC NULLS FIRST, id ASC
            LIMIT $3
            "#,
        )
        .bind(cutoff)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    async fn purge_if_flagged(&self, id: Uuid, blobs: &dyn BlobStore) -> Result<Option<File>> {
        let mut tx = self.pool.begin().await?;

        // Row lock makes a concurrent restore wait for this transaction
        let file = sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE id = $1 AND should_delete = TRUE FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(file) = file else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM favorites WHERE file_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Lock is still held, so a restore cannot slip in before the blob goes
        if let Err(e) = blobs.release(&file.blob_handle).await {
            tx.rollback().await?;
            return Err(e);
        }

        tx.commit().await?;

        Ok(Some(file))
    }
}
