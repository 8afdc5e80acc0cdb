//! Extractor Service
//!
//! Environment variables:
//! - NATS_URL: bus address (default: nats://localhost:4222)
//! - S3_ENDPOINT / S3_REGION / S3_ACCESS_KEY_ID / S3_SECRET_ACCESS_KEY / S3_PATH_STYLE
//! - WORKER_SLOTS: concurrent requests (default: 4)
//! - STAGE_TIMEOUT_SECS: bound on the store request (default: 10)
//! - LOG_FORMAT: `json` for JSON logs

use anyhow::Context;
use blob_store::{ObjectStore, S3ObjectStore};
use extractor_service::{Config, ExtractWorker};
use message_bus::{MessageBus, NatsBus, QueueConsumer, QueueConsumerConfig};
use picture_schema::{groups, subjects};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,extractor_service=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Starting Extractor Service");

    let config = Config::from_env();
    info!(
        nats = %config.nats.url,
        slots = config.worker_slots,
        store_timeout_ms = config.timeouts.nested().as_millis() as u64,
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

    let worker = Arc::new(ExtractWorker::new(store, bus.clone(), config.timeouts.nested()));

    QueueConsumer::new(
        bus,
        QueueConsumerConfig::new(subjects::EXTRACT, groups::EXTRACTOR, config.worker_slots),
        worker,
        shutdown_rx,
    )
    .run()
    .await
    .context("Extract consumer failed")?;

    info!("Extractor Service stopped");
    Ok(())
}
