use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::Caller;
use crate::features::access::Scope;
use crate::features::favorites::dtos::{FavoriteResponseDto, ToggleFavoriteResponseDto};
use crate::features::favorites::services::FavoriteService;
use crate::shared::types::ApiResponse;

/// Toggle the caller's favorite mark on a file
#[utoipa::path(
    post,
    path = "/api/files/{id}/favorite",
    tag = "favorites",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "New favorite state", body = ApiResponse<ToggleFavoriteResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No access to the file's scope"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_favorite(
    caller: Caller,
    State(service): State<Arc<FavoriteService>>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ToggleFavoriteResponseDto>>, AppError> {
    let is_favorited = service.toggle_favorite(caller.user(), file_id).await?;

    Ok(Json(ApiResponse::success(
        Some(ToggleFavoriteResponseDto {
            file_id,
            is_favorited,
        }),
        None,
        None,
    )))
}

/// List the caller's favorites within a scope
#[utoipa::path(
    get,
    path = "/api/scopes/{scope}/favorites",
    tag = "favorites",
    params(
        ("scope" = String, Path, description = "Scope, `org:<id>` or `user:<uuid>`")
    ),
    responses(
        (status = 200, description = "Favorites, newest first", body = ApiResponse<Vec<FavoriteResponseDto>>),
        (status = 400, description = "Malformed scope")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_favorites(
    caller: Caller,
    State(service): State<Arc<FavoriteService>>,
    Path(scope): Path<String>,
) -> Result<Json<ApiResponse<Vec<FavoriteResponseDto>>>, AppError> {
    let scope: Scope = scope.parse()?;

    let favorites = service
        .list_favorites(caller.user(), &scope)
        .await?
        .into_iter()
        .map(FavoriteResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::list(favorites)))
}
