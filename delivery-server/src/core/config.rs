use std::path::PathBuf;
use std::time::Duration;

use crate::orders::manager::DEFAULT_EVENT_CHANNEL_CAPACITY;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./work_dir | database and logs live here |
/// | HTTP_PORT | 3000 | HTTP port |
/// | ENVIRONMENT | development | development, staging or production |
/// | LOG_LEVEL | info | default log filter (`RUST_LOG` overrides) |
/// | LOG_JSON | false in development | JSON console logs |
/// | EVENT_CHANNEL_CAPACITY | 4096 | order event broadcast buffer |
/// | REQUEST_TIMEOUT_MS | 30000 | request timeout (not applied to live streams) |
/// | SSE_KEEP_ALIVE_SECS | 15 | keep-alive comment interval on live streams |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/delivery HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub event_channel_capacity: usize,
    pub request_timeout_ms: u64,
    pub sse_keep_alive_secs: u64,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let log_json_default = environment == "production";

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            http_port: env_or("HTTP_PORT", 3000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", log_json_default),
            event_channel_capacity: env_or(
                "EVENT_CHANNEL_CAPACITY",
                DEFAULT_EVENT_CHANNEL_CAPACITY,
            ),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30_000),
            sse_keep_alive_secs: env_or("SSE_KEEP_ALIVE_SECS", 15),
            environment,
        }
    }

    /// Override the parts tests care about
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// work_dir/database/orders.redb
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("orders.redb")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn sse_keep_alive(&self) -> Duration {
        Duration::from_secs(self.sse_keep_alive_secs.max(1))
    }

    /// Create work_dir/database and work_dir/logs
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
