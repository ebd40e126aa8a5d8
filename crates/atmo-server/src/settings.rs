//! Runtime settings for the aggregation server

use std::path::PathBuf;
use std::time::Duration;

use atmo_config::AppConfig;

/// Everything the server needs at construction time. Built from the TOML
/// configuration layer; tests construct it directly with ephemeral values.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Listen port; 0 picks an ephemeral port.
    pub port: u16,

    /// Canonical snapshot path.
    pub data_path: PathBuf,

    /// Maximum record age before eviction.
    pub expiry_seconds: i64,

    /// Sweeper period.
    pub sweep_period: Duration,

    /// Concurrent connection handler bound.
    pub pool_size: usize,

    /// Bounded request FIFO capacity.
    pub queue_capacity: usize,
}

impl Settings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            port: cfg.port(),
            data_path: PathBuf::from(cfg.data_path()),
            expiry_seconds: cfg.expiry_seconds(),
            sweep_period: Duration::from_secs(cfg.sweep_seconds()),
            pool_size: cfg.pool_size(),
            queue_capacity: cfg.queue_capacity(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 4567);
        assert_eq!(settings.expiry_seconds, 30);
        assert_eq!(settings.sweep_period, Duration::from_secs(10));
        assert_eq!(settings.pool_size, 10);
        assert_eq!(settings.queue_capacity, 128);
        assert_eq!(
            settings.data_path,
            PathBuf::from("resources/weather_data.json")
        );
    }
}
