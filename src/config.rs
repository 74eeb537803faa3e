//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `monitor.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ApiConfig: where the espmonitor backend lives.
//!     - PollingConfig: refresh period and history depth.
//!     - ServerConfig: where the dashboard page is served.
//!     - LoggingConfig: default log level, per-reading logging.
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::DEFAULT_HISTORY_LIMIT;
use crate::poller::DEFAULT_INTERVAL;

/// env var naming an explicit config file
pub const CONFIG_ENV: &str = "MONITOR_CONFIG";

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MonitorConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub history_limit: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        // port from esp32/config.example.h; app.py's own __main__ binds 8080
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_sensor_data: true,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl MonitorConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: MonitorConfig =
            toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        if config.polling.interval_ms == 0 {
            anyhow::bail!("polling.interval_ms must be greater than zero");
        }
        Ok(config)
    }

    /// Load with default fallback
    pub fn load_or_default() -> Self {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from("config").join("monitor.toml"));
        paths.push(PathBuf::from("..").join("config").join("monitor.toml"));

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to load config");
                    }
                }
            }
        }

        tracing::warn!("No config file found - using defaults");
        Self::default()
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        tracing::info!(
            api = %self.api.base_url,
            interval_ms = self.polling.interval_ms,
            history_limit = self.polling.history_limit,
            bind = %self.server.bind,
            log_level = %self.logging.level,
            "Configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = MonitorConfig::parse(
            r#"
[api]
base_url = "http://192.168.1.100:5000"

[polling]
interval_ms = 2000
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://192.168.1.100:5000");
        assert_eq!(config.polling.interval(), Duration::from_secs(2));
        assert_eq!(config.polling.history_limit, 20);
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = MonitorConfig::parse("").unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.polling.interval(), DEFAULT_INTERVAL);
        assert!(config.logging.show_sensor_data);
    }

    #[test]
    fn partial_sections_fill_missing_keys() {
        let config = MonitorConfig::parse(
            r#"
[api]
base_url = "http://10.0.0.7:8080"

[server]

[logging]
level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://10.0.0.7:8080");
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.show_sensor_data);

        let quiet = MonitorConfig::parse("[logging]\nshow_sensor_data = false\n").unwrap();
        assert_eq!(quiet.logging.level, "info");
        assert!(!quiet.logging.show_sensor_data);

        let polling = MonitorConfig::parse("[polling]\nhistory_limit = 5\n").unwrap();
        assert_eq!(polling.polling.interval(), DEFAULT_INTERVAL);
        assert_eq!(polling.polling.history_limit, 5);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = MonitorConfig::parse("[polling]\ninterval_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("interval_ms"));
    }
}
