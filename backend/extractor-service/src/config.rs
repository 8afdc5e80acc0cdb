use blob_store::S3Config;
use message_bus::{worker_slots_from_env, NatsConfig, Timeouts};

#[derive(Clone, Debug)]
pub struct Config {
    pub nats: NatsConfig,
    pub s3: S3Config,
    pub worker_slots: usize,
    pub timeouts: Timeouts,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            nats: NatsConfig::from_env("extractor-service"),
            s3: S3Config::from_env(),
            worker_slots: worker_slots_from_env(),
            timeouts: Timeouts::from_env(),
        }
    }
}
