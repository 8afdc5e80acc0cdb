//! Rendition processor
//!
//! Decodes an original once, then renders each downscaled rendition with
//! the Lanczos3 filter and re-encodes it with the codec named by the
//! picture's extension.
//!
//! Decoding and encoding are CPU bound and run on the blocking thread pool.

use crate::config::ResizeConfig;
use crate::error::{AppError, Result};
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Output codec, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCodec {
    Jpeg,
    Png,
}

impl ImageCodec {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ImageCodec::Jpeg),
            "png" => Ok(ImageCodec::Png),
            other => Err(AppError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// One encoded rendition
#[derive(Debug)]
pub struct Rendition {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Target size of a rendition: each side rounded, never below 1 px
pub fn rendition_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

pub struct RenditionProcessor {
    config: ResizeConfig,
}

impl RenditionProcessor {
    pub fn new(config: ResizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResizeConfig {
        &self.config
    }

    /// Decode the original (blocking)
    pub fn decode(&self, original: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(original).map_err(|e| AppError::Decode(e.to_string()))
    }

    /// Resize and encode one rendition (blocking)
    pub fn render(&self, image: &DynamicImage, codec: ImageCodec, scale: f64) -> Result<Rendition> {
        let (orig_w, orig_h) = image.dimensions();
        let (width, height) = rendition_dimensions(orig_w, orig_h, scale);

        let resized = image.resize_exact(width, height, FilterType::Lanczos3);
        let data = self.encode(&resized, codec)?;

        debug!(
            original_width = orig_w,
            original_height = orig_h,
            width,
            height,
            size = data.len(),
            "Rendition generated"
        );

        Ok(Rendition {
            data,
            width,
            height,
        })
    }

    pub async fn decode_async(self: Arc<Self>, original: Bytes) -> Result<Arc<DynamicImage>> {
        tokio::task::spawn_blocking(move || self.decode(&original).map(Arc::new))
            .await
            .map_err(|e| AppError::Internal(format!("Decode task panicked: {e}")))?
    }

    pub async fn render_async(
        self: Arc<Self>,
        image: Arc<DynamicImage>,
        codec: ImageCodec,
        scale: f64,
    ) -> Result<Rendition> {
        tokio::task::spawn_blocking(move || self.render(&image, codec, scale))
            .await
            .map_err(|e| AppError::Internal(format!("Resize task panicked: {e}")))?
    }

    fn encode(&self, image: &DynamicImage, codec: ImageCodec) -> Result<Bytes> {
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);

        match codec {
            // JPEG has no alpha channel
            ImageCodec::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
                .write_to(&mut cursor, ImageOutputFormat::Jpeg(self.config.jpeg_quality)),
            ImageCodec::Png => image.write_to(&mut cursor, ImageOutputFormat::Png),
        }
        .map_err(|e| AppError::Encode(e.to_string()))?;

        Ok(Bytes::from(buf))
    }
}
