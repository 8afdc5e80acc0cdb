//! Resizer Service
//!
//! Environment variables:
//! - NATS_URL: bus address (default: nats://localhost:4222)
//! - S3_ENDPOINT / S3_REGION / S3_ACCESS_KEY_ID / S3_SECRET_ACCESS_KEY / S3_PATH_STYLE
//! - WORKER_SLOTS: concurrent requests (default: 4)
//! - HALF_SCALE / THUMB_SCALE: rendition factors (default: 0.5 / 0.1)
//! - JPEG_QUALITY: 1-100 (default: 90)
//! - LOG_FORMAT: `json` for JSON logs

use anyhow::Context;
use blob_store::{ObjectStore, S3ObjectStore};
use message_bus::{MessageBus, NatsBus, QueueConsumer, QueueConsumerConfig};
use picture_schema::{groups, subjects};
use resizer_service::{Config, RenditionProcessor, ResizeWorker};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,resizer_service=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Starting Resizer Service");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        nats = %config.nats.url,
        slots = config.worker_slots,
        half_scale = config.resize.half_scale,
        thumb_scale = config.resize.thumb_scale,
        "Configuration loaded"
    );

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.s3).await);
    let bus: Arc<dyn MessageBus> = Arc::new(
        NatsBus::connect(&config.nats)
            .await
            .context("Failed to connect to NATS")?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl+c");
            return;
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let processor = Arc::new(RenditionProcessor::new(config.resize.clone()));
    let worker = Arc::new(ResizeWorker::new(store, processor));

    QueueConsumer::new(
        bus,
        QueueConsumerConfig::new(subjects::RESIZE, groups::RESIZER, config.worker_slots),
        worker,
        shutdown_rx,
    )
    .run()
    .await
    .context("Resize consumer failed")?;

    info!("Resizer Service stopped");
    Ok(())
}
