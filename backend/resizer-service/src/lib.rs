/// Resize worker
///
/// Member of the `resizer_queue` group on `picture.resize`. For each
/// picture it fetches the original, renders the half and thumb renditions
/// and stores them under the same object key.
pub mod config;
pub mod error;
pub mod processor;
pub mod worker;

pub use config::{Config, ResizeConfig};
pub use error::{AppError, Result};
pub use processor::{ImageCodec, Rendition, RenditionProcessor};
pub use worker::ResizeWorker;
