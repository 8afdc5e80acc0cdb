use std::time::Duration;

/// Connection settings for the NATS backend
#[derive(Clone, Debug)]
pub struct NatsConfig {
    pub url: String,
    pub client_name: String,
}

impl NatsConfig {
    pub fn from_env(client_name: &str) -> Self {
        Self {
            url: std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string()),
            client_name: client_name.to_string(),
        }
    }
}

/// Request timeouts used across the pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Processing stages: resize, extract, store
    pub stage: Duration,
    /// Read queries against the metadata store
    pub query: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            stage: Duration::from_secs(10),
            query: Duration::from_secs(5),
        }
    }
}

impl Timeouts {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stage: secs_from_env("STAGE_TIMEOUT_SECS").unwrap_or(defaults.stage),
            query: secs_from_env("QUERY_TIMEOUT_SECS").unwrap_or(defaults.query),
        }
    }

    /// Bound for a call made from inside a stage, such as the extractor's
    /// store request. Always shorter than `stage` so the inner call gives up
    /// before the caller of the stage does.
    pub fn nested(&self) -> Duration {
        self.stage * 4 / 5
    }
}

fn secs_from_env(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Concurrent requests per worker process (`WORKER_SLOTS`, default 4)
pub fn worker_slots_from_env() -> usize {
    std::env::var("WORKER_SLOTS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|slots| *slots > 0)
        .unwrap_or(4)
}
