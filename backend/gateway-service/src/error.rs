/// Error types for the gateway
///
/// Every failure is rendered as an [`ErrorResponse`] body. Stage failures
/// and timeouts surface as 500 with the `upstream_error` type.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use blob_store::StoreError;
use error_types::{error_codes, ErrorResponse};
use message_bus::RequestError;
use picture_schema::SchemaError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Upload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Picture {0} already exists")]
    Conflict(String),

    #[error("Picture {0} not found")]
    PictureNotFound(u64),

    #[error("Album {0} not found")]
    AlbumNotFound(String),

    #[error("{stage} timed out")]
    UpstreamTimeout { stage: String },

    #[error("{stage} failed: {msg}")]
    UpstreamFailure { stage: String, msg: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map a failed bus request for `stage`. A 504 reply means a call made by
    /// the stage itself timed out.
    pub fn upstream(stage: &str, err: RequestError) -> Self {
        if err.is_timeout() || err.failure_code() == Some(504) {
            return AppError::UpstreamTimeout {
                stage: stage.to_string(),
            };
        }

        let msg = match err {
            RequestError::Failure { msg, .. } => msg,
            other => other.to_string(),
        };
        AppError::UpstreamFailure {
            stage: stage.to_string(),
            msg,
        }
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::EmptyUpload => AppError::BadRequest(err.to_string()),
            SchemaError::InvalidExtension(_) => AppError::UnsupportedFormat(err.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::UnsupportedFormat(_)
            | AppError::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PictureNotFound(_) | AppError::AlbumNotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamTimeout { .. }
            | AppError::UpstreamFailure { .. }
            | AppError::Storage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error_type, code) = match self {
            AppError::BadRequest(_) => ("validation_error", error_codes::INVALID_REQUEST),
            AppError::UnsupportedFormat(_) => {
                ("validation_error", error_codes::UNSUPPORTED_FORMAT)
            }
            AppError::PayloadTooLarge { .. } => {
                ("validation_error", error_codes::UPLOAD_TOO_LARGE)
            }
            AppError::Conflict(_) => ("conflict_error", error_codes::PICTURE_ALREADY_EXISTS),
            AppError::PictureNotFound(_) => ("not_found_error", error_codes::PICTURE_NOT_FOUND),
            AppError::AlbumNotFound(_) => ("not_found_error", error_codes::ALBUM_NOT_FOUND),
            AppError::UpstreamTimeout { .. } => ("upstream_error", error_codes::UPSTREAM_TIMEOUT),
            AppError::UpstreamFailure { .. } => ("upstream_error", error_codes::UPSTREAM_FAILURE),
            AppError::Storage(_) => ("server_error", error_codes::STORAGE_ERROR),
            AppError::Internal(_) => ("server_error", error_codes::INTERNAL_SERVER_ERROR),
        };

        let message = self.to_string();
        let response = ErrorResponse::new(
            match status {
                StatusCode::BAD_REQUEST => "Bad Request",
                StatusCode::NOT_FOUND => "Not Found",
                StatusCode::CONFLICT => "Conflict",
                StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
                _ => "Error",
            },
            &message,
            status.as_u16(),
            error_type,
            code,
        );
        let response = match self {
            AppError::UpstreamTimeout { stage } | AppError::UpstreamFailure { stage, .. } => {
                response.with_details(format!("stage: {stage}"))
            }
            _ => response,
        };

        HttpResponse::build(status).json(response)
    }
}
