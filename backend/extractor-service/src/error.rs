use blob_store::StoreError;
use message_bus::RequestError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("{0}")]
    Persist(#[from] RequestError),

    #[error("internal error: {0}")]
    Internal(String),
}
