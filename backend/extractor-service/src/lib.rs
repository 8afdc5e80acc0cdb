/// Metadata extractor
///
/// Member of the `extractor_queue` group on `picture.extract`. Reads the
/// original, builds its metadata row and hands it to the database role on
/// `picture.store`. The store outcome becomes this worker's reply.
pub mod capture;
pub mod config;
pub mod error;
pub mod extractor;
pub mod worker;

pub use capture::{exposure_mode, parse_rational, CaptureFields};
pub use config::Config;
pub use error::{AppError, Result};
pub use extractor::MetadataExtractor;
pub use worker::ExtractWorker;
