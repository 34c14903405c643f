//! Storage module for file blobs
//!
//! File content never passes through this service. Clients upload straight to
//! MinIO/S3 using a presigned URL; the database keeps only the opaque handle.

mod blob_store;
mod minio_client;

pub use blob_store::{BlobStore, UploadTarget};
pub use minio_client::MinIOClient;
