//! Gateway Service
//!
//! Environment variables:
//! - GATEWAY_HOST / GATEWAY_PORT: HTTP bind address (default: 0.0.0.0:8000)
//! - MAX_UPLOAD_BYTES: largest accepted upload (default: 50 MiB)
//! - NATS_URL: bus address (default: nats://localhost:4222)
//! - S3_ENDPOINT / S3_REGION / S3_ACCESS_KEY_ID / S3_SECRET_ACCESS_KEY / S3_PATH_STYLE
//! - STAGE_TIMEOUT_SECS / QUERY_TIMEOUT_SECS: bus request bounds (default: 10 / 5)
//! - LOG_FORMAT: `json` for JSON logs

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use blob_store::{ObjectStore, S3ObjectStore};
use gateway_service::{configure, CatalogService, Config, IngestService};
use message_bus::{MessageBus, NatsBus};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,gateway_service=debug,actix_web=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Starting Gateway Service");

    let config = Config::from_env();
    let bind_address = config.bind_address();
    info!(
        address = %bind_address,
        nats = %config.nats.url,
        max_upload_bytes = config.app.max_upload_bytes,
        "Configuration loaded"
    );

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.s3).await);
    let bus: Arc<dyn MessageBus> = Arc::new(
        NatsBus::connect(&config.nats)
            .await
            .context("Failed to connect to NATS")?,
    );

    let ingest = web::Data::new(IngestService::new(
        store.clone(),
        bus.clone(),
        config.timeouts,
    ));
    let catalog = web::Data::new(CatalogService::new(bus, config.timeouts));
    let limits = web::Data::new(config.app.clone());
    let objects: web::Data<dyn ObjectStore> = web::Data::from(store);

    // actix-web stops on SIGINT and drains in-flight requests
    HttpServer::new(move || {
        App::new()
            .app_data(ingest.clone())
            .app_data(catalog.clone())
            .app_data(limits.clone())
            .app_data(objects.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("HTTP server failed")?;

    info!("Gateway Service stopped");
    Ok(())
}
