use crate::error::{AppError, Result};
use blob_store::S3Config;
use message_bus::{worker_slots_from_env, NatsConfig};

#[derive(Clone, Debug)]
pub struct Config {
    pub nats: NatsConfig,
    pub s3: S3Config,
    pub worker_slots: usize,
    pub resize: ResizeConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            nats: NatsConfig::from_env("resizer-service"),
            s3: S3Config::from_env(),
            worker_slots: worker_slots_from_env(),
            resize: ResizeConfig::from_env()?,
        })
    }
}

/// Rendition scale factors and encoder settings
#[derive(Clone, Debug, PartialEq)]
pub struct ResizeConfig {
    pub half_scale: f64,
    pub thumb_scale: f64,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            half_scale: 0.5,
            thumb_scale: 0.1,
            jpeg_quality: 90,
        }
    }
}

impl ResizeConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            half_scale: std::env::var("HALF_SCALE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.half_scale),
            thumb_scale: std::env::var("THUMB_SCALE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.thumb_scale),
            jpeg_quality: std::env::var("JPEG_QUALITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.jpeg_quality),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, scale) in [("HALF_SCALE", self.half_scale), ("THUMB_SCALE", self.thumb_scale)] {
            if !(scale > 0.0 && scale <= 1.0) {
                return Err(AppError::Config(format!(
                    "{name} must be in (0, 1], got {scale}"
                )));
            }
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AppError::Config(format!(
                "JPEG_QUALITY must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}
