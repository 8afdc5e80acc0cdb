//! In-process pipeline for cross-service tests
//!
//! Every role runs its real handler on an [`InMemoryBus`], sharing one
//! [`MemoryObjectStore`]. No external infrastructure is needed.
#![allow(dead_code)]

use blob_store::{MemoryObjectStore, ObjectStore};
use database_service::{AlbumStore, ColumnarMetadataStore, DatabaseHandler, ROUTES};
use extractor_service::ExtractWorker;
use gateway_service::{CatalogService, IngestService};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
use message_bus::{
    InMemoryBus, MessageBus, QueueConsumer, QueueConsumerConfig, RequestHandler, Timeouts,
};
use picture_schema::{groups, subjects};
use resizer_service::{RenditionProcessor, ResizeConfig, ResizeWorker};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

pub const SLOTS: usize = 2;
pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn timeouts() -> Timeouts {
    Timeouts {
        stage: TIMEOUT,
        query: TIMEOUT,
    }
}

pub struct Pipeline {
    pub bus: InMemoryBus,
    pub store: Arc<MemoryObjectStore>,
    shutdown_tx: watch::Sender<bool>,
    consumers: JoinSet<()>,
}

impl Pipeline {
    /// Start resizer, extractor and database roles and wait until every
    /// slot has joined its group
    pub async fn start() -> Self {
        let bus = InMemoryBus::new();
        let store = Arc::new(MemoryObjectStore::new());
        let shared_bus: Arc<dyn MessageBus> = Arc::new(bus.clone());
        let objects: Arc<dyn ObjectStore> = store.clone();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut pipeline = Self {
            bus,
            store,
            shutdown_tx,
            consumers: JoinSet::new(),
        };

        let resizer = Arc::new(ResizeWorker::new(
            objects.clone(),
            Arc::new(RenditionProcessor::new(ResizeConfig::default())),
        ));
        pipeline.spawn(&shared_bus, subjects::RESIZE, groups::RESIZER, resizer, &shutdown_rx);

        let extractor = Arc::new(ExtractWorker::new(objects.clone(), shared_bus.clone(), timeouts().nested()));
        pipeline.spawn(&shared_bus, subjects::EXTRACT, groups::EXTRACTOR, extractor, &shutdown_rx);

        let database = Arc::new(DatabaseHandler::new(
            Arc::new(ColumnarMetadataStore::new(objects.clone(), "database", "pictures.columns")),
            Arc::new(AlbumStore::new(objects, "database", "albums.columns")),
        ));
        for (subject, group) in ROUTES {
            pipeline.spawn(&shared_bus, subject, group, database.clone(), &shutdown_rx);
        }

        pipeline.wait_ready().await;
        pipeline
    }

    fn spawn<H: RequestHandler>(
        &mut self,
        bus: &Arc<dyn MessageBus>,
        subject: &str,
        group: &str,
        handler: Arc<H>,
        shutdown_rx: &watch::Receiver<bool>,
    ) {
        let consumer = QueueConsumer::new(
            bus.clone(),
            QueueConsumerConfig::new(subject, group, SLOTS),
            handler,
            shutdown_rx.clone(),
        );
        self.consumers.spawn(async move {
            consumer.run().await.unwrap();
        });
    }

    async fn wait_ready(&self) {
        let mut expected = vec![
            (subjects::RESIZE, groups::RESIZER),
            (subjects::EXTRACT, groups::EXTRACTOR),
        ];
        expected.extend(ROUTES);

        for _ in 0..200 {
            if expected
                .iter()
                .all(|(subject, group)| self.bus.member_count(subject, group) == SLOTS)
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("pipeline consumers did not subscribe in time");
    }

    pub fn ingest(&self) -> IngestService {
        IngestService::new(self.store.clone(), Arc::new(self.bus.clone()), timeouts())
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(Arc::new(self.bus.clone()), timeouts())
    }

    pub fn objects(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    /// Signal every slot and wait for the consumers to stop
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        while self.consumers.join_next().await.is_some() {}
    }
}

fn encode(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageOutputFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageOutputFormat::Jpeg(90))
}

/// Insert a one-byte JPEG comment segment right after SOI.
///
/// Two calls differing only in `byte` give images whose bytes differ in
/// exactly one position.
pub fn with_comment(jpeg: &[u8], byte: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(jpeg.len() + 5);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xFE, 0x00, 0x03, byte]);
    out.extend_from_slice(&jpeg[2..]);
    out
}
