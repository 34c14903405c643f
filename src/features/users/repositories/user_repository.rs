use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::users::models::User;

/// Persistence for user records
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_token(&self, token_identifier: &str) -> Result<Option<User>>;

    /// Insert the user if absent, otherwise refresh name and image
    async fn upsert(&self, token_identifier: &str, name: &str, image: Option<&str>)
        -> Result<User>;

    /// Append `org_id` to the user's memberships unless already present.
    ///
    /// Returns `None` when no user has this token identifier.
    async fn add_org_id(&self, token_identifier: &str, org_id: &str) -> Result<Option<User>>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_token(&self, token_identifier: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE token_identifier = $1")
            .bind(token_identifier)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn upsert(
        &self,
        token_identifier: &str,
        name: &str,
        image: Option<&str>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, token_identifier, name, image)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (token_identifier) DO UPDATE
            SET name = EXCLUDED.name,
                image = EXCLUDED.image,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(token_identifier)
        .bind(name)
        .bind(image)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn add_org_id(&self, token_identifier: &str, org_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET org_ids = CASE
                    WHEN $2::text = ANY(org_ids) THEN org_ids
                    ELSE array_append(org_ids, $2::text)
                END,
                updated_at = NOW()
            WHERE token_identifier = $1
            RETURNING *
            "#,
        )
        .bind(token_identifier)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
