//! Database Service
//!
//! Environment variables:
//! - NATS_URL: bus address (default: nats://localhost:4222)
//! - S3_ENDPOINT / S3_REGION / S3_ACCESS_KEY_ID / S3_SECRET_ACCESS_KEY / S3_PATH_STYLE
//! - WORKER_SLOTS: concurrent requests per subject (default: 4)
//! - DATABASE_BUCKET: bucket of the columnar objects (default: database)
//! - PICTURES_OBJECT_KEY / ALBUMS_OBJECT_KEY: object names
//! - LOG_FORMAT: `json` for JSON logs
//!
//! Writes are serialized inside this process only; run one instance.

use anyhow::Context;
use blob_store::{ObjectStore, S3ObjectStore};
use database_service::{AlbumStore, ColumnarMetadataStore, Config, DatabaseHandler, ROUTES};
use message_bus::{MessageBus, NatsBus, QueueConsumer, QueueConsumerConfig};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,database_service=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Starting Database Service");

    let config = Config::from_env();
    info!(
        nats = %config.nats.url,
        bucket = %config.storage.bucket,
        pictures = %config.storage.pictures_key,
        albums = %config.storage.albums_key,
        "Configuration loaded"
    );

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.s3).await);
    store
        .ensure_bucket(&config.storage.bucket)
        .await
        .context("Failed to ensure database bucket")?;

    let bus: Arc<dyn MessageBus> = Arc::new(
        NatsBus::connect(&config.nats)
            .await
            .context("Failed to connect to NATS")?,
    );

    let pictures = Arc::new(ColumnarMetadataStore::new(
        store.clone(),
        &config.storage.bucket,
        &config.storage.pictures_key,
    ));
    let albums = Arc::new(AlbumStore::new(
        store,
        &config.storage.bucket,
        &config.storage.albums_key,
    ));
    let handler = Arc::new(DatabaseHandler::new(pictures, albums));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl+c");
            return;
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let mut consumers = JoinSet::new();
    for (subject, group) in ROUTES {
        let consumer = QueueConsumer::new(
            bus.clone(),
            QueueConsumerConfig::new(subject, group, config.worker_slots),
            handler.clone(),
            shutdown_rx.clone(),
        );
        consumers.spawn(consumer.run());
    }

    while let Some(joined) = consumers.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Consumer failed"),
            Err(e) => error!(error = %e, "Consumer task panicked"),
        }
    }

    info!("Database Service stopped");
    Ok(())
}
