/// Gateway Service
///
/// HTTP entry point of the pipeline. Uploads are fingerprinted, checked
/// against the metadata record for that fingerprint, stored, then pushed
/// through the resize and extract roles over the message bus. Reads and
/// album management are forwarded to the database role, and rendition bytes
/// are served straight from the object store.
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use handlers::configure;
pub use services::{CatalogService, IngestService};
