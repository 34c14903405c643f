use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::{Scope, ScopeKind};

/// Kind of content behind a file's blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "file_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Pdf,
    Csv,
}

/// Database model for file records
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct File {
    pub id: Uuid,
    pub name: String,
    pub scope_kind: ScopeKind,
    pub scope_id: String,
    pub blob_handle: String,
    pub file_type: FileType,
    pub owner_id: Uuid,
    pub should_delete: bool,
    /// When the file was first moved to the deleted view; cleared on restore
    pub marked_for_deletion_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// The scope this file belongs to
    pub fn scope(&self) -> Result<Scope> {
        Scope::from_parts(self.scope_kind, &self.scope_id).map_err(|e| {
            AppError::Internal(format!("File {} has a corrupt scope: {}", self.id, e))
        })
    }
}

/// A file as seen by one viewer in a listing
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FileListing {
    #[sqlx(flatten)]
    pub file: File,
    pub is_favorited: bool,
}

/// Fields for a new file record
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub scope: Scope,
    pub blob_handle: String,
    pub file_type: FileType,
    pub owner_id: Uuid,
}

/// Listing filters; the default lists the active files of a scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    /// Case-sensitive substring of the name
    pub query: Option<String>,
    pub file_type: Option<FileType>,
    /// Only files the viewer has favorited
    pub favorites_only: bool,
    /// List the deleted view instead of active files
    pub deleted_only: bool,
}

impl FileFilter {
    pub fn matches(&self, file: &File, is_favorited: bool) -> bool {
        file.should_delete == self.deleted_only
            && self
                .query
                .as_deref()
                .is_none_or(|query| file.name.contains(query))
            && self.file_type.is_none_or(|t| t == file.file_type)
            && (!self.favorites_only || is_favorited)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// Row, favorites and blob are gone
    Purged,
    /// File was already purged or has been restored
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, file_type: FileType, should_delete: bool) -> File {
        File {
            id: Uuid::now_v7(),
            name: name.to_string(),
            scope_kind: ScopeKind::Organization,
            scope_id: "org_1".to_string(),
            blob_handle: "uploads/blob".to_string(),
            file_type,
            owner_id: Uuid::now_v7(),
            should_delete,
            marked_for_deletion_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_filter_hides_deleted_files() {
        let filter = FileFilter::default();
        assert!(filter.matches(&file("a.pdf", FileType::Pdf, false), false));
        assert!(!filter.matches(&file("a.pdf", FileType::Pdf, true), false));
    }

    #[test]
    fn test_query_is_case_sensitive_substring() {
        let filter = FileFilter {
            query: Some("port".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&file("report.csv", FileType::Csv, false), false));
        assert!(!filter.matches(&file("REPORT.csv", FileType::Csv, false), false));
    }

    #[test]
    fn test_type_and_favorites_filters_intersect() {
        let filter = FileFilter {
            file_type: Some(FileType::Image),
            favorites_only: true,
            ..Default::default()
        };
        assert!(filter.matches(&file("cat.png", FileType::Image, false), true));
        assert!(!filter.matches(&file("cat.png", FileType::Image, false), false));
        assert!(!filter.matches(&file("cat.pdf", FileType::Pdf, false), true));
    }

    #[test]
    fn test_scope_round_trips_through_columns() {
        let f = file("a", FileType::Pdf, false);
        assert_eq!(f.scope().unwrap(), Scope::Organization("org_1".to_string()));

        let corrupt = File {
            scope_kind: ScopeKind::Personal,
            scope_id: "not-a-uuid".to_string(),
            ..f
        };
        assert!(matches!(corrupt.scope(), Err(AppError::Internal(_))));
    }
}
