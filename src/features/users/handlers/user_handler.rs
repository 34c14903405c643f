use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::{AppJson, Caller};
use crate::features::users::dtos::{AddOrgMembershipDto, UpsertUserDto, UserResponseDto};
use crate::features::users::services::UserService;
use crate::shared::types::ApiResponse;

/// Get the current user's record
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "No synced user for this identity")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    caller: Caller,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>, AppError> {
    let user = service.get_me(caller.user()).await?;
    Ok(Json(ApiResponse::success(Some(user.into()), None, None)))
}

/// Create or refresh a user from the identity provider
#[utoipa::path(
    put,
    path = "/internal/users",
    tag = "identity-sync",
    request_body = UpsertUserDto,
    responses(
        (status = 200, description = "User synced", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid internal credentials")
    ),
    security(
        ("internal_basic" = [])
    )
)]
pub async fn upsert_user(
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<UpsertUserDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service
        .upsert_user(&dto.token_identifier, &dto.name, dto.image.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(
        Some(user.into()),
        Some("User synced".to_string()),
        None,
    )))
}

/// Add an organization membership to a user
#[utoipa::path(
    post,
    path = "/internal/users/org-memberships",
    tag = "identity-sync",
    request_body = AddOrgMembershipDto,
    responses(
        (status = 200, description = "Membership recorded", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid internal credentials"),
        (status = 404, description = "User not found")
    ),
    security(
        ("internal_basic" = [])
    )
)]
pub async fn add_org_membership(
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<AddOrgMembershipDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service
        .add_org_membership(&dto.token_identifier, &dto.org_id)
        .await?;

    Ok(Json(ApiResponse::success(Some(user.into()), None, None)))
}
