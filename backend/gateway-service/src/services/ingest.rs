//! Upload chain
//!
//! Each step runs only when the previous one succeeded. The metadata record
//! is written by the database role at the very end of the extract stage, so
//! a failed chain never leaves a visible record behind.
//!
//! A fingerprint that already has a record is a duplicate. A fingerprint with
//! every rendition but no record resumes at extract.

use crate::error::{AppError, Result};
use blob_store::ObjectStore;
use bytes::Bytes;
use message_bus::{request_command, request_data, MessageBus, Timeouts};
use picture_schema::{buckets, subjects, Picture, PictureId, PictureMetadata};
use std::sync::Arc;
use tracing::{info, warn};

pub struct IngestService {
    store: Arc<dyn ObjectStore>,
    bus: Arc<dyn MessageBus>,
    timeouts: Timeouts,
}

impl IngestService {
    pub fn new(store: Arc<dyn ObjectStore>, bus: Arc<dyn MessageBus>, timeouts: Timeouts) -> Self {
        Self {
            store,
            bus,
            timeouts,
        }
    }

    /// Run one upload through the pipeline and return its identity record
    pub async fn ingest(&self, data: Bytes, file_name: &str) -> Result<Picture> {
        let picture = Picture::from_upload(&data, file_name)?;
        let object_key = picture.object_key();

        if let Some(existing) = self.find_record(picture.key).await? {
            let existing_key = format!("{}.{}", existing.id, existing.ext);
            info!(picture_key = picture.key, object_key = %existing_key, "Duplicate upload rejected");
            return Err(AppError::Conflict(existing_key));
        }

        if self.has_renditions(&object_key).await? {
            info!(picture_key = picture.key, "Renditions present without a record, resuming at extract");
        } else {
            self.store.ensure_bucket(buckets::ORIGINAL).await?;
            self.store
                .put(buckets::ORIGINAL, &object_key, data)
                .await?;
            info!(
                picture_key = picture.key,
                bytes = picture.bytes_count,
                "Original stored"
            );

            self.run_stage("resize", subjects::RESIZE, &picture).await?;
        }
        self.run_stage("extract", subjects::EXTRACT, &picture).await?;

        info!(picture_key = picture.key, ext = %picture.ext, "Picture ingested");
        Ok(picture)
    }

    /// Metadata row for the fingerprint, whatever extension it was stored under
    async fn find_record(&self, key: u64) -> Result<Option<PictureMetadata>> {
        match request_data(&*self.bus, subjects::GET, &PictureId { id: key }, self.timeouts.query).await {
            Ok(row) => Ok(Some(row)),
            Err(e) if e.failure_code() == Some(404) => Ok(None),
            Err(e) => Err(AppError::upstream("lookup", e)),
        }
    }

    async fn has_renditions(&self, object_key: &str) -> Result<bool> {
        for bucket in buckets::RENDITIONS {
            if !self.store.exists(bucket, object_key).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn run_stage(&self, stage: &str, subject: &str, picture: &Picture) -> Result<()> {
        request_command(&*self.bus, subject, picture, self.timeouts.stage)
            .await
            .map_err(|e| {
                warn!(picture_key = picture.key, stage = %stage, error = %e, "Pipeline stage failed");
                AppError::upstream(stage, e)
            })?;
        Ok(())
    }
}
