use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::access::Scope;
use crate::features::favorites::models::Favorite;

/// Persistence for favorite marks
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Remove the mark if present, otherwise add it. Returns whether the file
    /// is favorited afterwards.
    async fn toggle(&self, user_id: Uuid, file_id: Uuid) -> Result<bool>;

    /// The user's favorites on files of `scope`, newest first
    async fn list_for_user_in_scope(&self, user_id: Uuid, scope: &Scope) -> Result<Vec<Favorite>>;
}

pub struct PgFavoriteRepository {
    pool: PgPool,
}

impl PgFavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for PgFavoriteRepository {
    async fn toggle(&self, user_id: Uuid, file_id: Uuid) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND file_id = $2")
            .bind(user_id)
            .bind(file_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        // A concurrent toggle may have inserted first; the unique index keeps one row
        sqlx::query(
            r#"
            INSERT INTO favorites (id, file_id, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, file_id) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(file_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn list_for_user_in_scope(&self, user_id: Uuid, scope: &Scope) -> Result<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT fav.*
            FROM favorites fav
            JOIN files f ON f.id = fav.file_id
            WHERE fav.user_id = $1
              AND f.scope_kind = $2
              AND f.scope_id = $3
            ORDER BY fav.created_at DESC, fav.id DESC
            "#,
        )
        .bind(user_id)
        .bind(scope.kind())
        .bind(scope.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(favorites)
    }
}
