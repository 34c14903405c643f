use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    create_file, get_download_url, issue_upload_url, list_files, restore_file, trash_file,
};
use crate::features::files::services::FileService;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>) -> Router {
    Router::new()
        .route("/api/files/upload-url", post(issue_upload_url))
        .route(
            "/api/scopes/{scope}/files",
            get(list_files).post(create_file),
        )
        .route("/api/files/{id}/trash", post(trash_file))
        .route("/api/files/{id}/restore", post(restore_file))
        .route("/api/files/{id}/download-url", get(get_download_url))
        .with_state(file_service)
}
