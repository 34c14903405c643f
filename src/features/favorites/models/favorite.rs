use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's favorite mark on a file
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}
