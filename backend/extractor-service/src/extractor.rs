use crate::capture::{exposure_mode, parse_rational, CaptureFields};
use crate::error::{AppError, Result};
use bytes::Bytes;
use picture_schema::{Orientation, Picture, PictureMetadata};
use std::io::Cursor;
use tracing::debug;

/// Builds the metadata row of a picture from its original bytes
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Blocking: reads the image header and the EXIF container.
    ///
    /// Only an unreadable image is an error; capture fields degrade to
    /// their defaults.
    pub fn extract(&self, picture: &Picture, data: &[u8]) -> Result<PictureMetadata> {
        let (width, height) = image::io::Reader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| AppError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| AppError::Decode(e.to_string()))?;

        let capture = CaptureFields::read(data);
        let orientation = Orientation::from_dimensions(width, height);

        debug!(
            picture_key = picture.key,
            width,
            height,
            camera = capture.model.as_deref().unwrap_or(""),
            "Metadata extracted"
        );

        Ok(PictureMetadata {
            id: picture.key,
            ext: picture.ext.clone(),
            timestamp: capture.timestamp(),
            camera: capture.model.clone().unwrap_or_default(),
            exposure_mode: exposure_mode(capture.exposure_program).to_string(),
            aperture: capture.f_number.as_deref().map(parse_rational).unwrap_or(0.0),
            iso_speed: capture
                .iso
                .and_then(|iso| i32::try_from(iso).ok())
                .unwrap_or(0),
            shutter_speed: capture.exposure_time.clone().unwrap_or_default(),
            focal_length: capture
                .focal_length
                .as_deref()
                .map(parse_rational)
                .unwrap_or(0.0),
            lens: capture.lens_model.clone().unwrap_or_default(),
            width,
            height,
            is_landscape: orientation.is_landscape,
            is_panoramic: orientation.is_panoramic,
            ..Default::default()
        })
    }

    pub async fn extract_async(self, picture: Picture, data: Bytes) -> Result<PictureMetadata> {
        tokio::task::spawn_blocking(move || self.extract(&picture, &data))
            .await
            .map_err(|e| AppError::Internal(format!("Extract task panicked: {e}")))?
    }
}
