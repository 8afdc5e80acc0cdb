//! One columnar object in the content store
//!
//! Reads decode the whole object. Mutations run read-modify-rewrite under
//! the table's writer lock and replace the object with a single put, so
//! readers see either the old or the new content.

use crate::columnar::{self, ColumnarRecord};
use crate::error::Result;
use blob_store::{get_optional, ObjectStore};
use bytes::Bytes;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub struct ColumnarTable<R> {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    key: String,
    writer: Mutex<()>,
    _rows: PhantomData<fn() -> R>,
}

impl<R: ColumnarRecord> ColumnarTable<R> {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str, key: &str) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            key: key.to_string(),
            writer: Mutex::new(()),
            _rows: PhantomData,
        }
    }

    /// Every row in insertion order; no object means no rows
    pub async fn load(&self) -> Result<Vec<R>> {
        match get_optional(&*self.store, &self.bucket, &self.key).await? {
            Some(data) => Ok(columnar::decode(&data)?),
            None => Ok(Vec::new()),
        }
    }

    /// Apply `change` to the current rows and rewrite the object when it
    /// reports a modification.
    ///
    /// `change` returns its result and whether the rows were modified.
    pub async fn modify<T>(&self, change: impl FnOnce(&mut Vec<R>) -> (T, bool)) -> Result<T> {
        let _guard = self.writer.lock().await;

        let mut rows = self.load().await?;
        let (result, modified) = change(&mut rows);

        if modified {
            let data = columnar::encode(&rows)?;
            let size = data.len();
            self.store.ensure_bucket(&self.bucket).await?;
            self.store
                .put(&self.bucket, &self.key, Bytes::from(data))
                .await?;
            debug!(
                bucket = %self.bucket,
                key = %self.key,
                rows = rows.len(),
                size,
                "Columnar object rewritten"
            );
        }

        Ok(result)
    }
}
