use anyhow::{Context, Result};
use config::{Config, Environment, Map};
use log::LevelFilter;
use serde::Deserialize;
use std::time::Duration;

/// Settings come from the environment only, e.g. `RESOVERLAY_OVERLAY__MODE=system`.
pub const ENV_PREFIX: &str = "RESOVERLAY";

const MIN_INTERVAL_MS: u64 = 100;

fn default_mode() -> String {
    "ask".to_string()
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_clear_screen() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// How the tracking mode is picked at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChoice {
    Ask,
    System,
    Window,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_clear_screen")]
    pub clear_screen: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CountersConfig {
    /// Comma separated block devices to count. Empty counts every physical disk.
    #[serde(default)]
    pub disks: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub counters: CountersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            interval_ms: default_interval_ms(),
            clear_screen: default_clear_screen(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl OverlayConfig {
    pub fn get_mode_choice(&self) -> ModeChoice {
        match self.mode.trim().to_lowercase().as_str() {
            "system" => ModeChoice::System,
            "window" => ModeChoice::Window,
            _ => ModeChoice::Ask,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_INTERVAL_MS))
    }
}

impl CountersConfig {
    pub fn disk_filter(&self) -> Vec<String> {
        self.disks
            .split(',')
            .map(str::trim)
            .filter(|disk| !disk.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        Self::from_env(None)
    }

    /// Load from the process environment, or from `vars` in its place.
    pub fn from_env(vars: Option<Map<String, String>>) -> Result<Self> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .context("Failed to load config from environment")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize config")?;

        Ok(app_config)
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }
}
