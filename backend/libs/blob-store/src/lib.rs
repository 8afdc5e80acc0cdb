/// Content store shared by the pipeline services
///
/// Objects are addressed by `(bucket, key)`. Two backends:
/// - [`S3ObjectStore`] for S3 and S3-compatible servers (MinIO)
/// - [`MemoryObjectStore`] for tests and single-process runs
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod config;
pub mod memory;
pub mod s3;

pub use config::S3Config;
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("bucket {0} does not exist")]
    BucketNotFound(String),

    #[error("object store request failed: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether `bucket/key` exists. A missing bucket counts as missing.
    async fn exists(&self, bucket: &str, key: &str) -> StoreResult<bool>;

    /// Write `data` under `bucket/key`, replacing any previous object in one
    /// operation. The bucket must exist.
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> StoreResult<()>;

    /// Read the whole object. Fails with [`StoreError::NotFound`] when absent.
    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Bytes>;

    /// Create the bucket unless it exists. Losing a creation race is not an
    /// error.
    async fn ensure_bucket(&self, bucket: &str) -> StoreResult<()>;
}

/// Read an object, mapping absence to `None`
pub async fn get_optional(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> StoreResult<Option<Bytes>> {
    match store.get(bucket, key).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(StoreError::BucketNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
