use blob_store::S3Config;
use message_bus::{worker_slots_from_env, NatsConfig};

#[derive(Clone, Debug)]
pub struct Config {
    pub nats: NatsConfig,
    pub s3: S3Config,
    pub worker_slots: usize,
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            nats: NatsConfig::from_env("database-service"),
            s3: S3Config::from_env(),
            worker_slots: worker_slots_from_env(),
            storage: StorageConfig::from_env(),
        }
    }
}

/// Where the columnar objects live
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    pub pictures_key: String,
    pub albums_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "database".to_string(),
            pictures_key: "pictures.columns".to_string(),
            albums_key: "albums.columns".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bucket: std::env::var("DATABASE_BUCKET").unwrap_or(defaults.bucket),
            pictures_key: std::env::var("PICTURES_OBJECT_KEY").unwrap_or(defaults.pictures_key),
            albums_key: std::env::var("ALBUMS_OBJECT_KEY").unwrap_or(defaults.albums_key),
        }
    }
}
