use crate::columnar::ColumnarError;
use blob_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("corrupt metadata object: {0}")]
    Columnar(#[from] ColumnarError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
