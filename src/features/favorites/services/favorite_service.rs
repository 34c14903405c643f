use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::access::{has_access, Scope};
use crate::features::auth::AuthenticatedUser;
use crate::features::favorites::models::Favorite;
use crate::features::favorites::repositories::FavoriteRepository;
use crate::features::files::FileService;
use crate::features::users::UserService;

/// Per-user favorite marks on files
pub struct FavoriteService {
    favorites: Arc<dyn FavoriteRepository>,
    files: Arc<FileService>,
    users: Arc<UserService>,
}

impl FavoriteService {
    pub fn new(
        favorites: Arc<dyn FavoriteRepository>,
        files: Arc<FileService>,
        users: Arc<UserService>,
    ) -> Self {
        Self {
            favorites,
            files,
            users,
        }
    }

    /// Flip the caller's favorite mark on a file; returns the new state
    pub async fn toggle_favorite(
        &self,
        caller: Option<&AuthenticatedUser>,
        file_id: Uuid,
    ) -> Result<bool> {
        let user = self.users.require_caller(caller).await?;
        let file = self.files.authorized_file(&user, file_id).await?;

        let favorited = self.favorites.toggle(user.id, file.id).await?;
        info!(
            "User {} {} file {}",
            user.id,
            if favorited { "favorited" } else { "unfavorited" },
            file.id
        );

        Ok(favorited)
    }

    /// The caller's favorites within `scope`; empty for anonymous or
    /// unauthorized callers
    pub async fn list_favorites(
        &self,
        caller: Option<&AuthenticatedUser>,
        scope: &Scope,
    ) -> Result<Vec<Favorite>> {
        let Some(user) = self.users.find_caller(caller).await? else {
            return Ok(Vec::new());
        };
        if !has_access(&user, scope) {
            debug!("User {} has no access to {}; no favorites", user.id, scope);
            return Ok(Vec::new());
        }

        self.favorites.list_for_user_in_scope(user.id, scope).await
    }
}
