use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub data_path: Option<String>,
    pub expiry_seconds: Option<i64>,
    pub sweep_seconds: Option<u64>,
    pub pool_size: Option<usize>,
    pub queue_capacity: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub server: Option<ServerSection>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppConfig {
    /// Load configuration from the ATMO_CONFIG path (TOML) if present, with
    /// reasonable defaults otherwise
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ATMO_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let cfg = if Path::new(&path).exists() {
            let s = fs::read_to_string(&path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Listen port (default 4567)
    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(4567)
    }

    /// Canonical snapshot path (default resources/weather_data.json)
    pub fn data_path(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.data_path.clone())
            .unwrap_or_else(|| "resources/weather_data.json".to_string())
    }

    /// Record TTL in seconds (default 30)
    pub fn expiry_seconds(&self) -> i64 {
        self.server
            .as_ref()
            .and_then(|s| s.expiry_seconds)
            .unwrap_or(30)
    }

    /// Sweeper period in seconds (default 10)
    pub fn sweep_seconds(&self) -> u64 {
        self.server
            .as_ref()
            .and_then(|s| s.sweep_seconds)
            .unwrap_or(10)
    }

    /// Concurrent connection handler bound (default 10)
    pub fn pool_size(&self) -> usize {
        self.server.as_ref().and_then(|s| s.pool_size).unwrap_or(10)
    }

    /// Bounded request FIFO capacity (default 128)
    pub fn queue_capacity(&self) -> usize {
        self.server
            .as_ref()
            .and_then(|s| s.queue_capacity)
            .unwrap_or(128)
    }
}
