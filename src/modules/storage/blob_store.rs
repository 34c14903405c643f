use async_trait::async_trait;

use crate::core::error::Result;

/// Where a client should PUT a new blob, and the handle to register afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Opaque handle to pass back when creating the file record
    pub blob_handle: String,
    /// Time-limited URL accepting a single PUT of the content
    pub upload_url: String,
}

/// Object storage holding file content, addressed by opaque handles.
///
/// Implementations must be safe to share across request handlers and the
/// deletion sweeper.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Reserve a fresh handle and a URL the client can upload to.
    async fn issue_upload_target(&self) -> Result<UploadTarget>;

    /// Permanently remove the blob behind `handle`.
    ///
    /// Releasing a handle that no longer exists is not an error.
    async fn release(&self, handle: &str) -> Result<()>;

    /// Resolve a time-limited download URL for `handle`.
    async fn resolve_url(&self, handle: &str) -> Result<String>;
}
