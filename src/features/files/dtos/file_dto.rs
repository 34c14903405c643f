use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use crate::core::error::AppError;
use crate::features::files::models::{File, FileFilter, FileListing, FileType};
use crate::features::files::services::CreateFileInput;
use crate::modules::storage::UploadTarget;

/// Request DTO registering an uploaded blob as a file.
///
/// Lengths are checked by the service once the caller is authorized.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFileDto {
    /// Display name, 1-255 characters
    #[schema(example = "Quarterly report.pdf", min_length = 1, max_length = 255)]
    pub name: String,
    /// Handle returned by `POST /api/files/upload-url`; each handle backs one file
    #[schema(min_length = 1, max_length = 512)]
    pub blob_handle: String,
    pub file_type: FileType,
}

impl From<CreateFileDto> for CreateFileInput {
    fn from(dto: CreateFileDto) -> Self {
        Self {
            name: dto.name,
            blob_handle: dto.blob_handle,
            file_type: dto.file_type,
        }
    }
}

/// Query params for listing a scope's files
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListFilesQuery {
    /// Case-sensitive substring of the file name
    pub query: Option<String>,
    /// Only files of this type
    #[serde(rename = "type")]
    pub file_type: Option<FileType>,
    /// Only files the caller has favorited
    #[serde(default)]
    pub favorites_only: bool,
    /// List the deleted view instead of active files
    #[serde(default)]
    pub deleted_only: bool,
}

impl From<ListFilesQuery> for FileFilter {
    fn from(query: ListFilesQuery) -> Self {
        Self {
            query: query.query.filter(|q| !q.is_empty()),
            file_type: query.file_type,
            favorites_only: query.favorites_only,
            deleted_only: query.deleted_only,
        }
    }
}

/// Response DTO for file records
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    pub id: Uuid,
    pub name: String,
    /// Owning scope, `org:<id>` or `user:<uuid>`
    #[schema(example = "org:org_2abcXYZ")]
    pub scope: String,
    pub blob_handle: String,
    pub file_type: FileType,
    pub owner_id: Uuid,
    /// True while the file sits in the deleted view
    pub should_delete: bool,
    pub marked_for_deletion_at: Option<DateTime<Utc>>,
    /// Whether the caller has favorited the file (listings only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorited: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<File> for FileResponseDto {
    type Error = AppError;

    /// Fails with `Internal` when the stored scope does not parse
    fn try_from(file: File) -> Result<Self, Self::Error> {
        let scope = file.scope()?.to_string();

        Ok(Self {
            id: file.id,
            name: file.name,
            scope,
            blob_handle: file.blob_handle,
            file_type: file.file_type,
            owner_id: file.owner_id,
            should_delete: file.should_delete,
            marked_for_deletion_at: file.marked_for_deletion_at,
            is_favorited: None,
            created_at: file.created_at,
            updated_at: file.updated_at,
        })
    }
}

impl TryFrom<FileListing> for FileResponseDto {
    type Error = AppError;

    fn try_from(listing: FileListing) -> Result<Self, Self::Error> {
        Ok(Self {
            is_favorited: Some(listing.is_favorited),
            ..Self::try_from(listing.file)?
        })
    }
}

/// Where to upload a new blob
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadUrlResponseDto {
    /// Pass this back in `CreateFileDto.blob_handle`
    pub blob_handle: String,
    /// Presigned URL accepting one PUT of the content
    pub upload_url: String,
}

impl From<UploadTarget> for UploadUrlResponseDto {
    fn from(target: UploadTarget) -> Self {
        Self {
            blob_handle: target.blob_handle,
            upload_url: target.upload_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadUrlResponseDto {
    /// Presigned, time-limited download URL
    pub url: String,
}
