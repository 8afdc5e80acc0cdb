/// Metadata database
///
/// Owns the columnar objects in the `database` bucket: one for picture
/// metadata, one for albums. Every mutation rewrites the whole object under
/// a per-object writer lock, so all slots of one process are serialized.
/// Run a single process per deployment.
pub mod albums;
pub mod columnar;
pub mod config;
pub mod error;
pub mod handler;
pub mod pictures;
pub mod table;

pub use albums::AlbumStore;
pub use config::{Config, StorageConfig};
pub use error::{AppError, Result};
pub use handler::{DatabaseHandler, ROUTES};
pub use pictures::{ColumnarMetadataStore, InsertOutcome, MetadataStore};
pub use table::ColumnarTable;
