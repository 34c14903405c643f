use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::favorites::models::Favorite;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FavoriteResponseDto {
    pub id: Uuid,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Favorite> for FavoriteResponseDto {
    fn from(favorite: Favorite) -> Self {
        Self {
            id: favorite.id,
            file_id: favorite.file_id,
            user_id: favorite.user_id,
            created_at: favorite.created_at,
        }
    }
}

/// State of the caller's favorite mark after a toggle
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleFavoriteResponseDto {
    pub file_id: Uuid,
    pub is_favorited: bool,
}
