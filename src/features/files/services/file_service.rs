use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::{has_access, Scope};
use crate::features::auth::AuthenticatedUser;
use crate::features::files::models::{File, FileFilter, FileListing, FileType, NewFile, PurgeOutcome};
use crate::features::files::repositories::FileRepository;
use crate::features::users::{User, UserService};
use crate::modules::storage::{BlobStore, UploadTarget};
use crate::shared::constants::{MAX_BLOB_HANDLE_LENGTH, MAX_FILE_NAME_LENGTH};

/// Caller-supplied fields of a new file
#[derive(Debug, Clone)]
pub struct CreateFileInput {
    pub name: String,
    pub blob_handle: String,
    pub file_type: FileType,
}

/// Access-controlled lifecycle of file records
pub struct FileService {
    files: Arc<dyn FileRepository>,
    users: Arc<UserService>,
    blob_store: Arc<dyn BlobStore>,
}

impl FileService {
    pub fn new(
        files: Arc<dyn FileRepository>,
        users: Arc<UserService>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            files,
            users,
            blob_store,
        }
    }

    /// Register an uploaded blob as a file of `scope`
    pub async fn create_file(
        &self,
        caller: Option<&AuthenticatedUser>,
        scope: Scope,
        input: CreateFileInput,
    ) -> Result<File> {
        let user = self.users.require_caller(caller).await?;
        if !has_access(&user, &scope) {
            return Err(AppError::Forbidden(format!("No access to scope {}", scope)));
        }

        let name_length = input.name.chars().count() as u64;
        if name_length == 0 || name_length > MAX_FILE_NAME_LENGTH {
            return Err(AppError::Validation(format!(
                "File name must be 1-{} characters",
                MAX_FILE_NAME_LENGTH
            )));
        }
        if input.blob_handle.is_empty() || input.blob_handle.len() as u64 > MAX_BLOB_HANDLE_LENGTH {
            return Err(AppError::Validation(format!(
                "blob_handle must be 1-{} bytes",
                MAX_BLOB_HANDLE_LENGTH
            )));
        }

        let scope_label = scope.to_string();
        let file = self
            .files
            .insert(NewFile {
                name: input.name,
                scope,
                blob_handle: input.blob_handle,
                file_type: input.file_type,
                owner_id: user.id,
            })
            .await?;

        info!(
            "File created: id={}, scope={}, owner={}",
            file.id, scope_label, file.owner_id
        );

        Ok(file)
    }

    /// Files of `scope` visible to the caller. Anonymous or unauthorized
    /// callers get an empty list.
    pub async fn list_files(
        &self,
        caller: Option<&AuthenticatedUser>,
        scope: &Scope,
        filter: &FileFilter,
    ) -> Result<Vec<FileListing>> {
        let Some(user) = self.users.find_caller(caller).await? else {
            return Ok(Vec::new());
        };
        if !has_access(&user, scope) {
            debug!("User {} has no access to {}; listing nothing", user.id, scope);
            return Ok(Vec::new());
        }

        self.files.list_by_scope(scope, filter, user.id).await
    }

    /// Move a file to the deleted view
    pub async fn mark_for_deletion(
        &self,
        caller: Option<&AuthenticatedUser>,
        file_id: Uuid,
    ) -> Result<File> {
        let user = self.users.require_caller(caller).await?;
        self.authorized_file(&user, file_id).await?;

        let file = self
            .files
            .set_should_delete(file_id, true)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        info!("File {} marked for deletion by user {}", file.id, user.id);
        Ok(file)
    }

    /// Bring a file back from the deleted view
    pub async fn restore(&self, caller: Option<&AuthenticatedUser>, file_id: Uuid) -> Result<File> {
        let user = self.users.require_caller(caller).await?;
        self.authorized_file(&user, file_id).await?;

        let file = self
            .files
            .set_should_delete(file_id, false)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        info!("File {} restored by user {}", file.id, user.id);
        Ok(file)
    }

    /// Permanently remove a flagged file, its favorites and its blob.
    ///
    /// Not access-checked; only the deletion sweeper calls this. If the blob
    /// cannot be released the file stays flagged, so the next sweep retries.
    pub async fn purge(&self, file_id: Uuid) -> Result<PurgeOutcome> {
        let file = match self
            .files
            .purge_if_flagged(file_id, self.blob_store.as_ref())
            .await
        {
            Ok(Some(file)) => file,
            Ok(None) => {
                debug!("File {} is no longer flagged; skipping purge", file_id);
                return Ok(PurgeOutcome::Skipped);
            }
            Err(e) => {
                error!("File {} could not be purged and stays flagged: {}", file_id, e);
                return Err(e);
            }
        };

        info!("File {} purged (blob '{}')", file.id, file.blob_handle);
        Ok(PurgeOutcome::Purged)
    }

    /// Flagged files whose grace period is over, at most `limit`, skipping
    /// the ids in `exclude`
    pub async fn pending_purge(
        &self,
        grace_period: Duration,
        exclude: &[Uuid],
        limit: i64,
    ) -> Result<Vec<File>> {
        let grace = chrono::Duration::from_std(grace_period)
            .map_err(|e| AppError::Internal(format!("Invalid grace period: {}", e)))?;

        self.files
            .list_pending_deletion(Utc::now() - grace, exclude, limit)
            .await
    }

    /// Time-limited download URL for a file's blob.
    ///
    /// Every failure to see the file reads as `NotFound`, and so does a file
    /// in the deleted view.
    pub async fn download_url(
        &self,
        caller: Option<&AuthenticatedUser>,
        file_id: Uuid,
    ) -> Result<String> {
        let not_found = || AppError::NotFound("File not found".to_string());

        let user = self.users.find_caller(caller).await?.ok_or_else(not_found)?;
        let file = self.files.get_by_id(file_id).await?.ok_or_else(not_found)?;
        if file.should_delete || !has_access(&user, &file.scope()?) {
            return Err(not_found());
        }

        self.blob_store.resolve_url(&file.blob_handle).await
    }

    /// Reserve a blob handle and upload URL for the caller
    pub async fn issue_upload_target(
        &self,
        caller: Option<&AuthenticatedUser>,
    ) -> Result<UploadTarget> {
        let user = self.users.require_caller(caller).await?;
        let target = self.blob_store.issue_upload_target().await?;
        debug!("Issued upload target {} to user {}", target.blob_handle, user.id);
        Ok(target)
    }

    /// Load a file the user may mutate: `NotFound` first, then `Forbidden`
    pub(crate) async fn authorized_file(&self, user: &User, file_id: Uuid) -> Result<File> {
        let file = self
            .files
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if !has_access(user, &file.scope()?) {
            return Err(AppError::Forbidden(
                "No access to this file's scope".to_string(),
            ));
        }

        Ok(file)
    }
}
