//! Shared API error body and error codes
//!
//! Every HTTP-facing service renders its failures with [`ErrorResponse`] so
//! clients can branch on `error_type` / `code` instead of parsing messages.

use serde::{Deserialize, Serialize};

/// Unified API error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short status title ("Bad Request", "Conflict", ...)
    pub error: String,

    /// Human readable explanation
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Error category used by clients for routing:
    /// - "validation_error" - input rejected
    /// - "not_found_error" - resource does not exist
    /// - "conflict_error" - resource already exists
    /// - "upstream_error" - a pipeline stage failed or timed out
    /// - "server_error" - internal failure
    pub error_type: String,

    /// Stable error code, see [`error_codes`]
    pub code: String,

    /// Optional context, such as the failing pipeline stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

/// Stable error codes, grouped by concern
pub mod error_codes {
    // Input
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const UNSUPPORTED_FORMAT: &str = "UNSUPPORTED_FORMAT";
    pub const UPLOAD_TOO_LARGE: &str = "UPLOAD_TOO_LARGE";

    // Pictures
    pub const PICTURE_ALREADY_EXISTS: &str = "PICTURE_ALREADY_EXISTS";
    pub const PICTURE_NOT_FOUND: &str = "PICTURE_NOT_FOUND";
    pub const ALBUM_NOT_FOUND: &str = "ALBUM_NOT_FOUND";

    // Pipeline
    pub const UPSTREAM_TIMEOUT: &str = "UPSTREAM_TIMEOUT";
    pub const UPSTREAM_FAILURE: &str = "UPSTREAM_FAILURE";

    // Infrastructure
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}
