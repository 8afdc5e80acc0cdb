/// In-memory object store
///
/// Same contract as the S3 backend, including "bucket must exist" on put.
/// Faults can be injected per bucket for pipeline failure tests.
use crate::{ObjectStore, StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<HashMap<String, HashMap<String, Bytes>>>,
    failing_buckets: RwLock<HashSet<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every put into `bucket` fail until [`Self::clear_faults`]
    pub fn fail_puts_to(&self, bucket: &str) {
        self.failing_buckets.write().insert(bucket.to_string());
    }

    pub fn clear_faults(&self) {
        self.failing_buckets.write().clear();
    }

    /// Keys currently stored in `bucket`, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let buckets = self.buckets.read();
        let mut keys: Vec<String> = buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        Ok(self
            .buckets
            .read()
            .get(bucket)
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false))
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> StoreResult<()> {
        if self.failing_buckets.read().contains(bucket) {
            return Err(StoreError::Backend(format!(
                "put {bucket}/{key}: injected fault"
            )));
        }

        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Bytes> {
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn ensure_bucket(&self, bucket: &str) -> StoreResult<()> {
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }
}
