//! MinIO/S3-compatible blob store
//!
//! Hands out presigned PUT/GET URLs and deletes objects on purge.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::blob_store::{BlobStore, UploadTarget};
use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    key_prefix: String,
    presigned_url_expiry_secs: u32,
    endpoint: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration and make sure the bucket exists
    pub async fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            key_prefix: config.key_prefix,
            presigned_url_expiry_secs: config.presigned_url_expiry_secs,
            endpoint: config.endpoint,
        };

        client.ensure_bucket_exists().await?;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, key_prefix: {}",
            client.endpoint,
            client.bucket.name(),
            client.key_prefix
        );

        Ok(client)
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        match self.create_bucket().await {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    async fn create_bucket(&self) -> Result<()> {
        Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to create bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        Ok(())
    }
}

/// Object key for a new blob: `{prefix}/{uuid v7}`
fn object_key(prefix: &str, id: Uuid) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        id.to_string()
    } else {
        format!("{}/{}", prefix, id)
    }
}

#[async_trait]
impl BlobStore for MinIOClient {
    async fn issue_upload_target(&self) -> Result<UploadTarget> {
        let key = object_key(&self.key_prefix, Uuid::now_v7());

        let upload_url = self
            .bucket
            .presign_put(&key, self.presigned_url_expiry_secs, None, None)
            .await
            .map_err(|e| {
                AppError::ExternalService(format!(
                    "Failed to generate upload URL for '{}': {}",
                    key, e
                ))
            })?;

        debug!("Issued upload target '{}'", key);

        Ok(UploadTarget {
            blob_handle: key,
            upload_url,
        })
    }

    async fn release(&self, handle: &str) -> Result<()> {
        // S3 answers 204 for missing keys too
        let response = self.bucket.delete_object(handle).await.map_err(|e| {
            AppError::ExternalService(format!("Failed to delete blob '{}': {}", handle, e))
        })?;

        let status = response.status_code();
        if !(200..300).contains(&status) && status != 404 {
            return Err(AppError::ExternalService(format!(
                "Failed to delete blob '{}': HTTP {}",
                handle, status
            )));
        }

        debug!("Released blob '{}' from bucket '{}'", handle, self.bucket.name());
        Ok(())
    }

    async fn resolve_url(&self, handle: &str) -> Result<String> {
        self.bucket
            .presign_get(handle, self.presigned_url_expiry_secs, None)
            .await
            .map_err(|e| {
                AppError::ExternalService(format!(
                    "Failed to generate presigned URL for '{}': {}",
                    handle, e
                ))
            })
    }
}
