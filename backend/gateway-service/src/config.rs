/// Configuration for the gateway
use blob_store::S3Config;
use message_bus::{NatsConfig, Timeouts};

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub nats: NatsConfig,
    pub s3: S3Config,
    pub timeouts: Timeouts,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        Self {
            app: AppConfig {
                host: std::env::var("GATEWAY_HOST").unwrap_or(defaults.host),
                port: std::env::var("GATEWAY_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.port),
                max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_upload_bytes),
            },
            nats: NatsConfig::from_env("gateway-service"),
            s3: S3Config::from_env(),
            timeouts: Timeouts::from_env(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}
