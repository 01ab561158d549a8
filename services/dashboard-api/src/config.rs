//! Service settings
//!
//! Layered the usual way: built-in defaults, then an optional TOML file,
//! then `DASHBOARD__SECTION__KEY` environment variables. A bare `PORT`
//! variable wins over everything for the listen port.
//!
//! The file is `$DASHBOARD_CONFIG` when set, otherwise `config/dashboard.toml`
//! under the working directory, otherwise the copy shipped next to this crate.

use config::{Config, Environment, File};
use serde::Deserialize;
use signal_engine::ForecastConfig;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::AppError;

/// Config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "DASHBOARD_CONFIG";

const BUNDLED_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/dashboard");

/// Pick the config file: explicit override, then working directory, then
/// the crate's bundled file
pub fn resolve_config_path(explicit: Option<String>) -> String {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        return path;
    }
    if Path::new(DEFAULT_CONFIG_PATH).with_extension("toml").is_file() {
        return DEFAULT_CONFIG_PATH.to_string();
    }
    BUNDLED_CONFIG_PATH.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub sources: SourceSettings,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    pub binance_url: String,
    pub coingecko_url: String,
    #[serde(default)]
    pub coingecko_api_key: Option<String>,
    pub enable_coingecko: bool,
    pub request_timeout_secs: u64,
}

impl SourceSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Settings {
    /// Load from the resolved config file (if present) and the environment
    pub fn load() -> Result<Self, AppError> {
        let path = resolve_config_path(std::env::var(CONFIG_PATH_ENV).ok());
        info!("Loading settings from {}", path);
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self, AppError> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080_i64)?
            .set_default("sources.binance_url", data_retrieval::sources::binance::DEFAULT_BINANCE_URL)?
            .set_default(
                "sources.coingecko_url",
                data_retrieval::sources::coingecko::DEFAULT_COINGECKO_URL,
            )?
            .set_default("sources.enable_coingecko", true)?
            .set_default("sources.request_timeout_secs", 10_i64)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("DASHBOARD").separator("__"))
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
