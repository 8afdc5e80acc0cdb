/// Service layer for the gateway
///
/// - Ingest service: the upload chain (dedup, store, resize, extract)
/// - Catalog service: reads, amendments and albums via the database role
pub mod catalog;
pub mod ingest;

pub use catalog::CatalogService;
pub use ingest::IngestService;
