//! S3 object storage

use crate::error::{MagicBucketError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tracing::debug;

/// Object storage as seen by the worker
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download `bucket/key` to `local_path`.
    ///
    /// Returns `Ok(false)` when the object does not exist; any other failure
    /// is an error.
    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<bool>;

    /// Upload `local_path` to `bucket/key`, overwriting any existing object
    async fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<()>;
}

/// S3-backed object store
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Create a store with a pre-built S3 client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a store from shared SDK configuration
    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<bool> {
        let response = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(response) => response,
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                {
                    debug!("s3://{}/{} does not exist", bucket, key);
                    return Ok(false);
                }
                return Err(MagicBucketError::Storage(format!(
                    "GetObject s3://{}/{} failed: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&err)
                )));
            }
        };

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| {
                MagicBucketError::Storage(format!(
                    "Reading body of s3://{}/{} failed: {}",
                    bucket, key, e
                ))
            })?
            .into_bytes();
        tokio::fs::write(local_path, &bytes).await?;
        debug!(
            "Downloaded {} bytes from s3://{}/{} to {}",
            bytes.len(),
            bucket,
            key,
            local_path.display()
        );
        Ok(true)
    }

    async fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<()> {
        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            MagicBucketError::Storage(format!("Reading {} failed: {}", local_path.display(), e))
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                MagicBucketError::Storage(format!(
                    "PutObject s3://{}/{} failed: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }
}
