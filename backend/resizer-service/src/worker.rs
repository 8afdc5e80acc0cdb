//! Resize request handling

use crate::error::Result;
use crate::processor::{ImageCodec, RenditionProcessor};
use async_trait::async_trait;
use blob_store::ObjectStore;
use bytes::Bytes;
use message_bus::{RequestHandler, ServiceResponse};
use picture_schema::{buckets, Picture};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct ResizeWorker {
    store: Arc<dyn ObjectStore>,
    processor: Arc<RenditionProcessor>,
}

impl ResizeWorker {
    pub fn new(store: Arc<dyn ObjectStore>, processor: Arc<RenditionProcessor>) -> Self {
        Self { store, processor }
    }

    /// Produce and store the half rendition, then the thumbnail.
    ///
    /// The first failure stops the remaining work.
    pub async fn resize(&self, picture: &Picture) -> Result<()> {
        let codec = ImageCodec::from_extension(&picture.ext)?;
        let object_key = picture.object_key();

        let original = self.store.get(buckets::ORIGINAL, &object_key).await?;
        let image = self.processor.clone().decode_async(original).await?;

        let config = self.processor.config();
        for (bucket, scale) in [
            (buckets::HALF, config.half_scale),
            (buckets::THUMB, config.thumb_scale),
        ] {
            let rendition = self
                .processor
                .clone()
                .render_async(image.clone(), codec, scale)
                .await?;

            self.store.ensure_bucket(bucket).await?;
            self.store.put(bucket, &object_key, rendition.data).await?;

            debug!(
                picture_key = picture.key,
                bucket = %bucket,
                width = rendition.width,
                height = rendition.height,
                "Rendition stored"
            );
        }

        info!(picture_key = picture.key, ext = %picture.ext, "Picture resized");
        Ok(())
    }
}

#[async_trait]
impl RequestHandler for ResizeWorker {
    async fn handle(&self, subject: &str, payload: Bytes) -> Bytes {
        let picture: Picture = match serde_json::from_slice(&payload) {
            Ok(picture) => picture,
            Err(e) => {
                error!(subject = %subject, error = %e, "Invalid resize request");
                return ServiceResponse::failure(format!("invalid resize request: {e}")).to_bytes();
            }
        };

        let response = match self.resize(&picture).await {
            Ok(()) => ServiceResponse::ok(format!("picture {} resized", picture.key)),
            Err(e) => {
                error!(picture_key = picture.key, error = %e, "Resize failed");
                ServiceResponse::failure(e.to_string())
            }
        };
        response.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResizeConfig;
    use blob_store::MemoryObjectStore;
    use image::{DynamicImage, GenericImageView, ImageBuffer, ImageOutputFormat, Rgb};
    use std::io::Cursor;

    fn jpeg_fixture(width: u32, height: u32) -> Bytes {
        let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 64]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(90))
            .unwrap();
        Bytes::from(buf)
    }

    async fn worker_with_original(picture: &Picture, data: Bytes) -> (ResizeWorker, Arc<MemoryObjectStore>) {
        let store = Arc::new(MemoryObjectStore::new());
        store.ensure_bucket(buckets::ORIGINAL).await.unwrap();
        store
            .put(buckets::ORIGINAL, &picture.object_key(), data)
            .await
            .unwrap();

        let processor = Arc::new(RenditionProcessor::new(ResizeConfig::default()));
        (ResizeWorker::new(store.clone(), processor), store)
    }

    fn picture(ext: &str) -> Picture {
        Picture {
            key: 42,
            ext: ext.to_string(),
            bytes_count: 0,
        }
    }

    #[tokio::test]
    async fn test_resize_stores_both_renditions() {
        let picture = picture("jpg");
        let (worker, store) = worker_with_original(&picture, jpeg_fixture(200, 100)).await;

        let reply = worker
            .handle("picture.resize", Bytes::from(serde_json::to_vec(&picture).unwrap()))
            .await;
        let reply: ServiceResponse = serde_json::from_slice(&reply).unwrap();
        assert!(reply.is_success(), "{reply:?}");

        let half = store.get(buckets::HALF, "42.jpg").await.unwrap();
        assert_eq!(image::load_from_memory(&half).unwrap().dimensions(), (100, 50));

        let thumb = store.get(buckets::THUMB, "42.jpg").await.unwrap();
        assert_eq!(image::load_from_memory(&thumb).unwrap().dimensions(), (20, 10));
    }

    #[tokio::test]
    async fn test_unsupported_extension_fails_before_work() {
        let picture = picture("gif");
        let (worker, store) = worker_with_original(&picture, Bytes::from_static(b"GIF89a")).await;

        let err = worker.resize(&picture).await.unwrap_err();
        assert!(err.to_string().contains("unsupported image format"));
        assert!(store.keys(buckets::HALF).is_empty());
    }

    #[tokio::test]
    async fn test_missing_original_reports_failure() {
        let store = Arc::new(MemoryObjectStore::new());
        let processor = Arc::new(RenditionProcessor::new(ResizeConfig::default()));
        let worker = ResizeWorker::new(store, processor);

        let reply = worker
            .handle(
                "picture.resize",
                Bytes::from(serde_json::to_vec(&picture("png")).unwrap()),
            )
            .await;
        let reply: ServiceResponse = serde_json::from_slice(&reply).unwrap();
        assert_eq!(reply.code, 500);
    }

    #[tokio::test]
    async fn test_thumb_failure_keeps_half() {
        let picture = picture("jpg");
        let (worker, store) = worker_with_original(&picture, jpeg_fixture(40, 40)).await;
        store.fail_puts_to(buckets::THUMB);

        let err = worker.resize(&picture).await.unwrap_err();
        assert!(err.to_string().contains("injected fault"));
        assert_eq!(store.keys(buckets::HALF), vec!["42.jpg".to_string()]);
        assert!(store.keys(buckets::THUMB).is_empty());
    }

    #[tokio::test]
    async fn test_malformed_request() {
        let store = Arc::new(MemoryObjectStore::new());
        let processor = Arc::new(RenditionProcessor::new(ResizeConfig::default()));
        let worker = ResizeWorker::new(store, processor);

        let reply = worker.handle("picture.resize", Bytes::from_static(b"{")).await;
        let reply: ServiceResponse = serde_json::from_slice(&reply).unwrap();
        assert!(!reply.is_success());
    }
}
