//! Picture identity record and content fingerprinting

use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("upload is empty")]
    EmptyUpload,

    #[error("file name has no usable extension: {0:?}")]
    InvalidExtension(String),
}

/// Identity of an uploaded picture, threaded through every pipeline stage.
///
/// Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    /// Content fingerprint of the original bytes
    pub key: u64,
    /// Lower-cased extension without dot, selects the codec
    pub ext: String,
    /// Size of the original upload in bytes
    pub bytes_count: i64,
}

impl Picture {
    /// Build the identity record for an upload.
    pub fn from_upload(data: &[u8], file_name: &str) -> Result<Self, SchemaError> {
        if data.is_empty() {
            return Err(SchemaError::EmptyUpload);
        }

        let ext = normalize_extension(file_name)
            .ok_or_else(|| SchemaError::InvalidExtension(file_name.to_string()))?;

        Ok(Self {
            key: fingerprint(data),
            ext,
            bytes_count: data.len() as i64,
        })
    }

    /// Object key shared by every rendition bucket
    pub fn object_key(&self) -> String {
        format!("{}.{}", self.key, self.ext)
    }
}

/// XXH64 (seed 0) of the whole payload.
///
/// Not collision resistant: two uploads that collide are treated as the
/// same picture.
pub fn fingerprint(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}

/// Extension after the last dot, lower-cased and folded to one spelling per
/// codec (`jpeg` and `jpe` become `jpg`, `tif` becomes `tiff`).
///
/// Returns `None` when there is no dot, the extension is empty, or it holds
/// anything but ASCII alphanumerics.
pub fn normalize_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    let canonical = match ext.as_str() {
        "jpeg" | "jpe" => "jpg",
        "tif" => "tiff",
        other => other,
    };
    Some(canonical.to_string())
}
