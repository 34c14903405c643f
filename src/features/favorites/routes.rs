use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::favorites::handlers::{list_favorites, toggle_favorite};
use crate::features::favorites::services::FavoriteService;

/// Create routes for the favorites feature
pub fn routes(favorite_service: Arc<FavoriteService>) -> Router {
    Router::new()
        .route("/api/files/{id}/favorite", post(toggle_favorite))
        .route("/api/scopes/{scope}/favorites", get(list_favorites))
        .with_state(favorite_service)
}
