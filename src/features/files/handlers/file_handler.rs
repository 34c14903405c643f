use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::{AppJson, Caller};
use crate::features::access::Scope;
use crate::features::files::dtos::{
    CreateFileDto, DownloadUrlResponseDto, FileResponseDto, ListFilesQuery, UploadUrlResponseDto,
};
use crate::features::files::services::FileService;
use crate::shared::types::ApiResponse;

/// Get a presigned URL to upload a new blob to
#[utoipa::path(
    post,
    path = "/api/files/upload-url",
    tag = "files",
    responses(
        (status = 200, description = "Upload target issued", body = ApiResponse<UploadUrlResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 502, description = "Blob storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn issue_upload_url(
    caller: Caller,
    State(service): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<UploadUrlResponseDto>>, AppError> {
    let target = service.issue_upload_target(caller.user()).await?;
    Ok(Json(ApiResponse::success(Some(target.into()), None, None)))
}

/// Register an uploaded blob as a file of a scope
#[utoipa::path(
    post,
    path = "/api/scopes/{scope}/files",
    tag = "files",
    params(
        ("scope" = String, Path, description = "Scope, `org:<id>` or `user:<uuid>`")
    ),
    request_body = CreateFileDto,
    responses(
        (status = 201, description = "File created", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No access to the scope"),
        (status = 409, description = "Blob handle already registered")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_file(
    caller: Caller,
    State(service): State<Arc<FileService>>,
    Path(scope): Path<String>,
    AppJson(dto): AppJson<CreateFileDto>,
) -> Result<(StatusCode, Json<ApiResponse<FileResponseDto>>), AppError> {
    let scope: Scope = scope.parse()?;

    let file = service
        .create_file(caller.user(), scope, dto.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(FileResponseDto::try_from(file)?),
            Some("File created".to_string()),
            None,
        )),
    ))
}

/// List a scope's files
///
/// Anonymous callers and callers without access get an empty list.
#[utoipa::path(
    get,
    path = "/api/scopes/{scope}/files",
    tag = "files",
    params(
        ("scope" = String, Path, description = "Scope, `org:<id>` or `user:<uuid>`"),
        ListFilesQuery
    ),
    responses(
        (status = 200, description = "Files, newest first", body = ApiResponse<Vec<FileResponseDto>>),
        (status = 400, description = "Malformed scope")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    caller: Caller,
    State(service): State<Arc<FileService>>,
    Path(scope): Path<String>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>, AppError> {
    let scope: Scope = scope.parse()?;

    let files = service
        .list_files(caller.user(), &scope, &query.into())
        .await?
        .into_iter()
        .map(FileResponseDto::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ApiResponse::list(files)))
}

/// Move a file to the deleted view
#[utoipa::path(
    post,
    path = "/api/files/{id}/trash",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File marked for deletion", body = ApiResponse<FileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No access to the file's scope"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn trash_file(
    caller: Caller,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileResponseDto>>, AppError> {
    let file = service.mark_for_deletion(caller.user(), id).await?;
    Ok(Json(ApiResponse::success(
        Some(FileResponseDto::try_from(file)?),
        None,
        None,
    )))
}

/// Restore a file from the deleted view
#[utoipa::path(
    post,
    path = "/api/files/{id}/restore",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File restored", body = ApiResponse<FileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No access to the file's scope"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn restore_file(
    caller: Caller,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileResponseDto>>, AppError> {
    let file = service.restore(caller.user(), id).await?;
    Ok(Json(ApiResponse::success(
        Some(FileResponseDto::try_from(file)?),
        None,
        None,
    )))
}

/// Get a presigned download URL for a file
#[utoipa::path(
    get,
    path = "/api/files/{id}/download-url",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Download URL", body = ApiResponse<DownloadUrlResponseDto>),
        (status = 404, description = "File not found or not visible to the caller")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_download_url(
    caller: Caller,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DownloadUrlResponseDto>>, AppError> {
    let url = service.download_url(caller.user(), id).await?;
    Ok(Json(ApiResponse::success(
        Some(DownloadUrlResponseDto { url }),
        None,
        None,
    )))
}
