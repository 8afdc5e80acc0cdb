//! Extract request handling

use crate::error::{AppError, Result};
use crate::extractor::MetadataExtractor;
use async_trait::async_trait;
use blob_store::ObjectStore;
use bytes::Bytes;
use message_bus::{request_command, MessageBus, RequestError, RequestHandler, ServiceResponse};
use picture_schema::{buckets, subjects, Picture};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub struct ExtractWorker {
    store: Arc<dyn ObjectStore>,
    bus: Arc<dyn MessageBus>,
    extractor: MetadataExtractor,
    store_timeout: Duration,
}

impl ExtractWorker {
    pub fn new(store: Arc<dyn ObjectStore>, bus: Arc<dyn MessageBus>, store_timeout: Duration) -> Self {
        Self {
            store,
            bus,
            extractor: MetadataExtractor::new(),
            store_timeout,
        }
    }

    /// Extract the metadata row and persist it through the database role
    pub async fn extract_and_store(&self, picture: &Picture) -> Result<ServiceResponse> {
        let original = self
            .store
            .get(buckets::ORIGINAL, &picture.object_key())
            .await?;

        let metadata = self
            .extractor
            .extract_async(picture.clone(), original)
            .await?;

        let stored = request_command(&*self.bus, subjects::STORE, &metadata, self.store_timeout).await?;

        info!(picture_key = picture.key, "Picture metadata stored");
        Ok(stored)
    }
}

// Relay the store failure message unchanged, and a store timeout as 504
fn failure_reply(err: &AppError) -> ServiceResponse {
    match err {
        AppError::Persist(e) if e.is_timeout() => ServiceResponse::timeout(e.to_string()),
        AppError::Persist(RequestError::Failure { msg, .. }) => ServiceResponse::failure(msg.clone()),
        other => ServiceResponse::failure(other.to_string()),
    }
}

#[async_trait]
impl RequestHandler for ExtractWorker {
    async fn handle(&self, subject: &str, payload: Bytes) -> Bytes {
        let picture: Picture = match serde_json::from_slice(&payload) {
            Ok(picture) => picture,
            Err(e) => {
                error!(subject = %subject, error = %e, "Invalid extract request");
                return ServiceResponse::failure(format!("invalid extract request: {e}")).to_bytes();
            }
        };

        match self.extract_and_store(&picture).await {
            Ok(stored) => stored.to_bytes(),
            Err(e) => {
                error!(picture_key = picture.key, error = %e, "Extraction failed");
                failure_reply(&e).to_bytes()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blob_store::MemoryObjectStore;
    use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
    use message_bus::{InMemoryBus, Subscription};
    use picture_schema::PictureMetadata;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Bytes {
        let img = ImageBuffer::from_fn(width, height, |_, y| Rgb([0, y as u8, 0]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        Bytes::from(buf)
    }

    /// Stand-in database role answering every store with `reply`
    fn spawn_store_responder(mut sub: Subscription, reply: ServiceResponse) -> tokio::task::JoinHandle<Vec<PictureMetadata>> {
        tokio::spawn(async move {
            let mut seen = Vec::new();
            if let Some(message) = sub.next().await {
                seen.push(serde_json::from_slice(&message.payload).unwrap());
                message.respond(reply.to_bytes()).await.unwrap();
            }
            seen
        })
    }

    async fn setup() -> (Arc<MemoryObjectStore>, InMemoryBus, Picture) {
        let store = Arc::new(MemoryObjectStore::new());
        let picture = Picture {
            key: 99,
            ext: "png".to_string(),
            bytes_count: 0,
        };
        store.ensure_bucket(buckets::ORIGINAL).await.unwrap();
        store
            .put(buckets::ORIGINAL, &picture.object_key(), png(40, 20))
            .await
            .unwrap();
        (store, InMemoryBus::new(), picture)
    }

    #[tokio::test]
    async fn test_forwards_metadata_to_store() {
        let (store, bus, picture) = setup().await;
        let sub = bus.queue_subscribe(subjects::STORE, "db").await.unwrap();
        let responder = spawn_store_responder(sub, ServiceResponse::ok("stored"));

        let worker = ExtractWorker::new(store, Arc::new(bus), Duration::from_secs(1));
        let reply = worker
            .handle(subjects::EXTRACT, Bytes::from(serde_json::to_vec(&picture).unwrap()))
            .await;
        let reply: ServiceResponse = serde_json::from_slice(&reply).unwrap();
        assert!(reply.is_success());

        let seen = responder.await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, 99);
        assert_eq!((seen[0].width, seen[0].height), (40, 20));
        assert!(seen[0].is_landscape);
    }

    #[tokio::test]
    async fn test_store_failure_is_relayed() {
        let (store, bus, picture) = setup().await;
        let sub = bus.queue_subscribe(subjects::STORE, "db").await.unwrap();
        let _responder = spawn_store_responder(sub, ServiceResponse::failure("disk full"));

        let worker = ExtractWorker::new(store, Arc::new(bus), Duration::from_secs(1));
        let reply = worker
            .handle(subjects::EXTRACT, Bytes::from(serde_json::to_vec(&picture).unwrap()))
            .await;
        let reply: ServiceResponse = serde_json::from_slice(&reply).unwrap();
        assert_eq!(reply.code, 500);
        assert_eq!(reply.msg, "disk full");
    }

    #[tokio::test]
    async fn test_no_database_role() {
        let (store, bus, picture) = setup().await;
        let worker = ExtractWorker::new(store, Arc::new(bus), Duration::from_millis(50));

        let err = worker.extract_and_store(&picture).await.unwrap_err();
        assert!(matches!(err, AppError::Persist(_)));
    }

    #[tokio::test]
    async fn test_silent_database_role_replies_504() {
        let (store, bus, picture) = setup().await;
        let _silent = bus.queue_subscribe(subjects::STORE, "db").await.unwrap();

        let worker = ExtractWorker::new(store, Arc::new(bus.clone()), Duration::from_millis(50));
        let reply = worker
            .handle(subjects::EXTRACT, Bytes::from(serde_json::to_vec(&picture).unwrap()))
            .await;
        let reply: ServiceResponse = serde_json::from_slice(&reply).unwrap();
        assert_eq!(reply.code, 504);
    }
}
